pub const FIRST_LEDGER_PERIODS: &str = r#"SELECT ledger_entry.kind,
    ledger_entry.senior_id,
    MIN(ledger_entry.year * 100 + ledger_entry.month) AS first_period
    FROM ledger_entry
    GROUP BY ledger_entry.kind, ledger_entry.senior_id"#;

pub const ACTIVITY_STATISTICS: &str = r#"SELECT activity_log.action,
    COUNT(*) AS total
    FROM activity_log
    GROUP BY activity_log.action
    ORDER BY total DESC, activity_log.action ASC"#;

pub const SENIOR_STATUS_COUNTS: &str = r#"SELECT senior.status,
    COUNT(*) AS total
    FROM senior
    GROUP BY senior.status"#;
