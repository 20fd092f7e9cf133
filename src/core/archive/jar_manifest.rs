// ─── META-INF/MANIFEST.MF ───

pub const JAR_MANIFEST: &str = "META-INF/MANIFEST.MF";

/// Read a main-section attribute, honouring 72-column continuation lines.
pub fn main_attribute(text: &str, key: &str) -> Option<String> {
    let mut value: Option<String> = None;
    let mut current_key: Option<&str> = None;
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        // a blank line ends the main section
        if line.is_empty() {
            break;
        }
        if let Some(rest) = line.strip_prefix(' ') {
            if current_key == Some(key) {
                if let Some(v) = &mut value {
                    v.push_str(rest);
                }
            }
            continue;
        }

        if let Some((k, v)) = line.split_once(':') {
            current_key = Some(k.trim());
            if k.trim() == key {
                value = Some(v.trim().to_string());
            }
        }
    }
    value.filter(|v| !v.is_empty())
}
