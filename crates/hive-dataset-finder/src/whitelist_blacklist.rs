// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Lance Authors

//! Database/table inclusion and exclusion rules.
//!
//! A list is a comma-separated set of tokens. Each token is either `db`
//! (every table of the matching databases) or `db.tables`, where `tables` is a
//! `|`-separated set of table patterns. In both parts `*` matches any run of
//! characters and everything else is literal. Matching ignores case.
//!
//! ```text
//! whitelist = "sales.orders_*|customers, audit"
//! blacklist = "sales.orders_tmp*, audit_*"
//! ```
//!
//! An empty whitelist accepts everything. The blacklist always wins.

use std::fmt;

use regex::Regex;
use snafu::{Location, ResultExt, Snafu};

use crate::properties::{Properties, BLACKLIST_KEY, WHITELIST_KEY};

#[derive(Debug, Snafu)]
pub enum PatternError {
    #[snafu(display("Invalid whitelist/blacklist token '{token}': expected <db> or <db>.<table>"))]
    InvalidToken {
        token: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Pattern '{pattern}' does not compile: {source}"))]
    Compile {
        pattern: String,
        source: regex::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Clone)]
enum TablePattern {
    All,
    Matching(Regex),
}

#[derive(Debug, Clone)]
struct Rule {
    database: Regex,
    tables: Vec<TablePattern>,
}

impl Rule {
    fn covers_all_tables(&self) -> bool {
        self.tables.iter().any(|t| matches!(t, TablePattern::All))
    }

    fn matches_table(&self, table: &str) -> bool {
        self.tables.iter().any(|t| match t {
            TablePattern::All => true,
            TablePattern::Matching(re) => re.is_match(table),
        })
    }
}

/// Accepts or rejects databases and tables by name.
#[derive(Clone)]
pub struct WhitelistBlacklist {
    whitelist: Vec<Rule>,
    blacklist: Vec<Rule>,
    source: (String, String),
}

impl fmt::Debug for WhitelistBlacklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhitelistBlacklist")
            .field("whitelist", &self.source.0)
            .field("blacklist", &self.source.1)
            .finish()
    }
}

impl WhitelistBlacklist {
    pub fn new(whitelist: &str, blacklist: &str) -> Result<Self, PatternError> {
        Ok(Self {
            whitelist: parse_rules(whitelist)?,
            blacklist: parse_rules(blacklist)?,
            source: (whitelist.to_string(), blacklist.to_string()),
        })
    }

    /// Read `hive.dataset.whitelist` and `hive.dataset.blacklist`; both default
    /// to empty.
    pub fn from_properties(properties: &Properties) -> Result<Self, PatternError> {
        Self::new(
            properties.get_or(WHITELIST_KEY, ""),
            properties.get_or(BLACKLIST_KEY, ""),
        )
    }

    /// A whitelist of exactly one database and one table pattern.
    pub fn for_database(database: &str, table_pattern: &str) -> Result<Self, PatternError> {
        Self::new(&format!("{}.{}", database, table_pattern), "")
    }

    /// Whether any table of `db` can be accepted.
    ///
    /// A database is rejected outright only when a blacklist token covers
    /// all of its tables.
    pub fn accept_db(&self, db: &str) -> bool {
        let db = db.to_lowercase();
        let blacklisted = self
            .blacklist
            .iter()
            .any(|r| r.database.is_match(&db) && r.covers_all_tables());
        if blacklisted {
            return false;
        }
        self.whitelist.is_empty() || self.whitelist.iter().any(|r| r.database.is_match(&db))
    }

    pub fn accept_table(&self, db: &str, table: &str) -> bool {
        let db = db.to_lowercase();
        let table = table.to_lowercase();
        let matches = |rules: &[Rule]| {
            rules
                .iter()
                .any(|r| r.database.is_match(&db) && r.matches_table(&table))
        };
        if matches(&self.blacklist) {
            return false;
        }
        self.whitelist.is_empty() || matches(&self.whitelist)
    }
}

fn parse_rules(list: &str) -> Result<Vec<Rule>, PatternError> {
    let mut rules = Vec::new();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let token = token.to_lowercase();
        let parts: Vec<&str> = token.split('.').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return InvalidTokenSnafu { token: token.as_str() }.fail();
        }

        let (database, tables) = match parts.as_slice() {
            [db] => (*db, vec![TablePattern::All]),
            [db, tables] => {
                let tables = tables
                    .split('|')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| {
                        if t == "*" {
                            Ok(TablePattern::All)
                        } else {
                            glob_to_regex(t).map(TablePattern::Matching)
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (*db, tables)
            }
            _ => return InvalidTokenSnafu { token: token.as_str() }.fail(),
        };

        rules.push(Rule {
            database: glob_to_regex(database)?,
            tables,
        });
    }
    Ok(rules)
}

fn glob_to_regex(glob: &str) -> Result<Regex, PatternError> {
    let body = glob
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let pattern = format!("^{}$", body);
    Regex::new(&pattern).context(CompileSnafu { pattern })
}
