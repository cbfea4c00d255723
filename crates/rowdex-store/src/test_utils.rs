//! Test fixtures for rowdex-store.
//!
//! Entity types with hand-written `TableEntity` impls, plus a few deliberately
//! broken ones for configuration-error tests.

use chrono::{DateTime, FixedOffset, TimeZone};
use rowdex_commons::{ETag, FieldDescriptor, FieldKind, FieldMap, Result, TableEntity};
use std::sync::Arc;
use uuid::Uuid;

use crate::converter::DescriptorConverter;
use crate::in_memory::InMemoryTableStore;
use crate::index::{IndexBuilder, IndexRegistry};
use crate::indexed_table::IndexedTable;
use crate::query::QuerySettings;

/// Employee: partitioned by department, identified by a GUID.
#[derive(Debug, Clone, PartialEq)]
pub struct TestEmployee {
    pub id: Uuid,
    pub department_id: i32,
    pub name: String,
    pub onboard_date: DateTime<FixedOffset>,
    pub etag: Option<ETag>,
}

impl TestEmployee {
    pub fn new(department_id: i32, id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            department_id,
            name: name.into(),
            onboard_date: default_onboard_date(),
            etag: None,
        }
    }
}

fn default_onboard_date() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .and_then(|offset| offset.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single())
        .unwrap_or_default()
}

impl TableEntity for TestEmployee {
    const TABLE_NAME: &'static str = "employee";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("Id", FieldKind::Guid),
        FieldDescriptor::new("DepartmentId", FieldKind::Int32),
        FieldDescriptor::new("Name", FieldKind::String),
        FieldDescriptor::new("OnboardDate", FieldKind::DateTimeOffset),
    ];

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("Id", self.id)
            .with("DepartmentId", self.department_id)
            .with("Name", self.name.as_str())
            .with("OnboardDate", self.onboard_date)
    }

    fn from_fields(fields: &FieldMap) -> Result<Self> {
        Ok(Self {
            id: fields.get_guid("Id")?,
            department_id: fields.get_i32("DepartmentId")?,
            name: fields.opt_string("Name")?.unwrap_or_default(),
            onboard_date: fields
                .opt_datetime_offset("OnboardDate")?
                .unwrap_or_else(default_onboard_date),
            etag: None,
        })
    }

    fn etag(&self) -> Option<&ETag> {
        self.etag.as_ref()
    }

    fn set_etag(&mut self, etag: Option<ETag>) {
        self.etag = etag;
    }
}

/// Department: partitioned by company, with an integer id.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDepartment {
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub manager_id: Uuid,
    pub etag: Option<ETag>,
}

impl TestDepartment {
    pub fn new(company_id: i32, id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            company_id,
            name: name.into(),
            manager_id: Uuid::nil(),
            etag: None,
        }
    }
}

impl TableEntity for TestDepartment {
    const TABLE_NAME: &'static str = "department";
    const FIELDS: &'static [FieldDescriptor] = &[
        FieldDescriptor::new("Id", FieldKind::Int32),
        FieldDescriptor::new("CompanyId", FieldKind::Int32),
        FieldDescriptor::new("Name", FieldKind::String),
        FieldDescriptor::new("ManagerId", FieldKind::Guid),
    ];

    fn to_fields(&self) -> FieldMap {
        FieldMap::new()
            .with("Id", self.id)
            .with("CompanyId", self.company_id)
            .with("Name", self.name.as_str())
            .with("ManagerId", self.manager_id)
    }

    fn from_fields(fields: &FieldMap) -> Result<Self> {
        Ok(Self {
            id: fields.get_i32("Id")?,
            company_id: fields.get_i32("CompanyId")?,
            name: fields.get_string("Name")?,
            manager_id: fields.get_guid("ManagerId")?,
            etag: None,
        })
    }

    fn etag(&self) -> Option<&ETag> {
        self.etag.as_ref()
    }

    fn set_etag(&mut self, etag: Option<ETag>) {
        self.etag = etag;
    }
}

// Declares fields through a macro so the broken fixtures stay short.
macro_rules! broken_entity {
    ($name:ident, $table:literal, [$($field:literal => $kind:ident),* $(,)?]) => {
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            pub etag: Option<ETag>,
        }

        impl TableEntity for $name {
            const TABLE_NAME: &'static str = $table;
            const FIELDS: &'static [FieldDescriptor] =
                &[$(FieldDescriptor::new($field, FieldKind::$kind)),*];

            fn to_fields(&self) -> FieldMap {
                FieldMap::new()
            }

            fn from_fields(_fields: &FieldMap) -> Result<Self> {
                Ok(Self::default())
            }

            fn etag(&self) -> Option<&ETag> {
                self.etag.as_ref()
            }

            fn set_etag(&mut self, etag: Option<ETag>) {
                self.etag = etag;
            }
        }
    };
}

broken_entity!(NoIdentity, "no_identity", ["Name" => String]);
broken_entity!(ReservedFields, "reserved", ["Name" => String, "ETag" => String]);
broken_entity!(DuplicateFields, "duplicate", ["Name" => String, "Name" => String]);

/// Employee table with the `default` (department, id) and `name` (department, name) indexes.
pub fn employee_table(store: Arc<InMemoryTableStore>) -> IndexedTable<TestEmployee> {
    employee_table_with_settings(store, QuerySettings::default())
}

pub fn employee_table_with_settings(
    store: Arc<InMemoryTableStore>,
    settings: QuerySettings,
) -> IndexedTable<TestEmployee> {
    let registry = IndexRegistry::new()
        .with_index(
            IndexBuilder::<TestEmployee>::new("default")
                .partition(|k| k.add(|e: &TestEmployee| e.department_id))
                .row_key(|k| k.identity())
                .build()
                .expect("default index"),
        )
        .and_then(|registry| {
            registry.with_index(
                IndexBuilder::<TestEmployee>::new("name")
                    .partition(|k| k.add(|e: &TestEmployee| e.department_id))
                    .row_key(|k| k.add(|e: &TestEmployee| e.name.clone()))
                    .build()
                    .expect("name index"),
            )
        })
        .expect("employee registry");

    IndexedTable::new(
        store,
        Arc::new(registry),
        Arc::new(DescriptorConverter::<TestEmployee>::new().expect("employee converter")),
    )
    .with_settings(settings)
}

/// Department table with the `default` (company, id) and `name` (company, "namerow", name) indexes.
pub fn department_table(store: Arc<InMemoryTableStore>) -> IndexedTable<TestDepartment> {
    let registry = IndexRegistry::new()
        .with_index(
            IndexBuilder::<TestDepartment>::new("default")
                .partition(|k| k.add(|d: &TestDepartment| d.company_id))
                .row_key(|k| k.add(|d: &TestDepartment| d.id))
                .build()
                .expect("default index"),
        )
        .and_then(|registry| {
            registry.with_index(
                IndexBuilder::<TestDepartment>::new("name")
                    .partition(|k| k.add(|d: &TestDepartment| d.company_id))
                    .row_key(|k| k.constant("namerow").add(|d: &TestDepartment| d.name.clone()))
                    .build()
                    .expect("name index"),
            )
        })
        .expect("department registry");

    IndexedTable::new(
        store,
        Arc::new(registry),
        Arc::new(DescriptorConverter::<TestDepartment>::new().expect("department converter")),
    )
}
