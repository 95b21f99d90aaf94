// Table definitions for the protected-entity registries.
// DDL text and catalog verification are both derived from these specs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
    /// Type name as reported by `information_schema.columns.udt_name`.
    pub udt_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

const fn column(name: &'static str, sql_type: &'static str, udt_name: &'static str) -> ColumnSpec {
    ColumnSpec {
        name,
        sql_type,
        udt_name,
    }
}

pub const PROTECTED_IP: TableSpec = TableSpec {
    name: "protected_ip",
    columns: &[
        column("organization", "TEXT", "text"),
        column("desc_brief", "TEXT", "text"),
        column("diem_id", "TEXT", "text"),
        column("authority", "TEXT", "text"),
        column("net", "CIDR", "cidr"),
    ],
};

pub const PROTECTED_ASN: TableSpec = TableSpec {
    name: "protected_asn",
    columns: &[
        column("organization", "TEXT", "text"),
        column("desc_brief", "TEXT", "text"),
        column("diem_id", "TEXT", "text"),
        column("authority", "TEXT", "text"),
        column("asn", "BIGINT", "int8"),
    ],
};

pub const PROTECTED_LOCATION: TableSpec = TableSpec {
    name: "protected_location",
    columns: &[
        column("organization", "TEXT", "text"),
        column("id", "INTEGER", "int4"),
        column("desc_brief", "TEXT", "text"),
        column("diem_id", "TEXT", "text"),
        column("date_designated", "DATE", "date"),
        column("date_updated", "DATE", "date"),
        column("location", "GEOMETRY", "geometry"),
    ],
};

impl TableSpec {
    pub fn create_statement(&self, if_not_exists: bool) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {} {}", quote_ident(c.name), c.sql_type))
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE {}{} (\n{}\n)",
            if if_not_exists { "IF NOT EXISTS " } else { "" },
            quote_ident(self.name),
            columns
        )
    }
}

/// Quote an identifier for PostgreSQL, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
