pub(super) fn default_name() -> String {
    "questlog".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.questlog".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_db_path() -> String {
    "~/.questlog/challenges.db".to_string()
}
pub(super) fn default_page_size() -> usize {
    10
}
pub(super) fn default_idle_timeout_secs() -> u64 {
    60
}
pub(super) fn default_min_score() -> u8 {
    50
}
pub(super) fn default_search_limit() -> usize {
    20
}
