//! Interactive prompts for account commands.

use std::io::{self, Write};

use anyhow::Result;

/// Ask for an email, offering `default` when the input is left blank
pub fn email(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) if !last.is_empty() => print!("Email Address [{}]: ", last),
        _ => print!("Email Address: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(resolve_email(&input, default))
}

/// Read a password without echoing it
pub fn password(label: &str) -> Result<String> {
    let password = rpassword::prompt_password(label)?;
    Ok(password)
}

fn resolve_email(input: &str, default: Option<&str>) -> String {
    let input = input.trim();
    if input.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_email() {
        assert_eq!(resolve_email("a@b.com\n", None), "a@b.com");
        assert_eq!(resolve_email("\n", Some("last@b.com")), "last@b.com");
        assert_eq!(resolve_email("  new@b.com ", Some("last@b.com")), "new@b.com");
        assert_eq!(resolve_email("", None), "");
    }
}
