pub fn render(source: &str, kind: &str, line: usize, message: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = line.saturating_sub(1);
    let source_line = lines.get(line_idx).copied().unwrap_or("");

    let line_num = line.to_string();
    let gutter_width = line_num.len();

    let mut out = String::new();

    // error[kind]: message
    out.push_str(&format!("error[{}]: {}\n", kind, message));

    // --> line N
    out.push_str(&format!(
        "{:>width$}--> line {}\n",
        " ",
        line,
        width = gutter_width
    ));

    // empty gutter line
    out.push_str(&format!("{:>width$} |\n", " ", width = gutter_width));

    // source line
    out.push_str(&format!(
        "{:>width$} | {}\n",
        line,
        source_line,
        width = gutter_width
    ));

    out.push_str(&format!("{:>width$} |\n", " ", width = gutter_width));

    out
}
