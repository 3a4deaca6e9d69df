/// Reads an on/off setting. `1`, `true`, `yes` and `on` (in any case) switch it on, `0`, `false`, `no` and `off` switch
/// it off. A missing or unrecognised value leaves it at `default`.
pub fn parse_boolean_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
