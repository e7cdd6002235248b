//! Identifier quoting per SQL dialect.

use clap::ValueEnum;
use relmeta_core::Quoter;

/// SQL dialect used to quote generated identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    /// MySQL backtick quoting
    Mysql,
    /// ANSI double-quote quoting
    Ansi,
}

impl Dialect {
    /// Quoter for this dialect.
    pub fn quoter(self) -> &'static dyn Quoter {
        match self {
            Dialect::Mysql => &Backticks,
            Dialect::Ansi => &DoubleQuotes,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Mysql => write!(f, "mysql"),
            Dialect::Ansi => write!(f, "ansi"),
        }
    }
}

/// Wraps `name` in `quote`, doubling any embedded quote characters.
fn quote_with(quote: char, name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    out.push(quote);
    for c in name.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
    out
}

struct Backticks;

impl Quoter for Backticks {
    fn quote_table_name(&self, name: &str) -> String {
        quote_with('`', name)
    }

    fn quote_column_name(&self, name: &str) -> String {
        quote_with('`', name)
    }
}

struct DoubleQuotes;

impl Quoter for DoubleQuotes {
    fn quote_table_name(&self, name: &str) -> String {
        quote_with('"', name)
    }

    fn quote_column_name(&self, name: &str) -> String {
        quote_with('"', name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_quoting() {
        let quoter = Dialect::Mysql.quoter();
        assert_eq!(quoter.quote_table_name("users"), "`users`");
        assert_eq!(quoter.quote_column_name("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_ansi_quoting() {
        let quoter = Dialect::Ansi.quoter();
        assert_eq!(quoter.quote_table_name("users"), "\"users\"");
        assert_eq!(quoter.quote_column_name("say\"hi"), "\"say\"\"hi\"");
    }
}
