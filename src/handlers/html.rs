//! Markup helpers. Anything taken from a request goes through [`escape`].

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reduce a query value to characters that can appear in a CSS color
/// (`red`, `#fff`, `rgb(1, 2, 3)`), so it cannot add declarations.
pub fn css_color(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' ')
        })
        .collect()
}

/// Username/password form posting to `action`.
pub fn credentials_form(title: &str, action: &str) -> String {
    format!(
        r#"
  {title}
    <form action='{action}' method='post'>
      <input name='username' type='text' placeholder='username'>
      <input name='password' type='password' placeholder='password'>
      <button>Submit</button>
    </form>
  "#
    )
}

pub fn email_form() -> String {
    r#"
    email address:
    <form action='/submitEmail' method='post'>
      <input name='email' type='text' placeholder='email'>
      <button>Submit</button>
    </form>
  "#
    .to_string()
}
