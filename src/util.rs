/// The formatted local time, as sent in the 003 reply of the welcome burst.
pub fn time_str() -> String {
    chrono::Local::now().to_rfc2822()
}
