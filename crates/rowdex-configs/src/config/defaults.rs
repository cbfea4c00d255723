// Default value functions

pub fn default_max_page_size() -> usize {
    1000 // Largest page the remote table service returns
}

pub fn default_max_pages() -> usize {
    10_000
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "compact".to_string()
}

pub fn default_true() -> bool {
    true
}
