use super::{Migration, SimpleSqlMigration};

pub fn migration() -> impl Migration {
    SimpleSqlMigration {
        serial_number: 0,
        sql: vec![
            // Balances live on the user row; the ledger keeps them consistent with the
            // transaction log. from_user is NULL for system-funded recharges.
            r#"
            CREATE TABLE users (
                id UUID PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                password TEXT NOT NULL,
                balance_cents BIGINT NOT NULL,
                nfc_tag TEXT UNIQUE,
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"CREATE INDEX user_email ON users (email)"#,
            r#"CREATE INDEX user_nfc_tag ON users (nfc_tag)"#,
            r#"
            CREATE TABLE transactions (
                id UUID PRIMARY KEY,
                from_user UUID REFERENCES users,
                to_user UUID NOT NULL REFERENCES users,
                amount_cents BIGINT NOT NULL,
                description TEXT NOT NULL,
                method INT NOT NULL,
                created TIMESTAMP WITH TIME ZONE NOT NULL
            )"#,
            r#"CREATE INDEX transaction_from_user ON transactions (from_user, created)"#,
            r#"CREATE INDEX transaction_to_user ON transactions (to_user, created)"#,
        ],
    }
}
