//! Fixed HTML pages.

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Secrets</title>
</head>
<body>
"#;

const FOOT: &str = "</body>\n</html>\n";

fn page(body: &str) -> String {
    format!("{HEAD}{body}{FOOT}")
}

pub fn home() -> String {
    page(
        r#"  <h1>Secrets</h1>
  <p>Don't keep your secrets, share them anonymously!</p>
  <a href="/register">Register</a>
  <a href="/login">Login</a>
"#,
    )
}

fn credentials_form(action: &str, submit: &str) -> String {
    format!(
        r#"  <form action="{action}" method="POST">
    <label for="username">Email</label>
    <input type="email" id="username" name="username">
    <label for="password">Password</label>
    <input type="password" id="password" name="password">
    <button type="submit">{submit}</button>
  </form>
  <a href="/auth/google">Sign in with Google</a>
"#
    )
}

pub fn register() -> String {
    page(&format!(
        "  <h1>Register</h1>\n{}",
        credentials_form("/register", "Register")
    ))
}

pub fn login() -> String {
    page(&format!(
        "  <h1>Login</h1>\n{}",
        credentials_form("/login", "Login")
    ))
}

pub fn secrets() -> String {
    page(
        r#"  <h1>You've Discovered My Secret!</h1>
  <p>Jack Bauer is my hero.</p>
  <form action="/secrets" method="POST">
    <button type="submit">Log Out</button>
  </form>
"#,
    )
}

pub fn error(status: u16, message: &str) -> String {
    page(&format!(
        "  <h1>{status}</h1>\n  <p>{}</p>\n  <a href=\"/\">Home</a>\n",
        escape(message)
    ))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
