//! Database schema, applied idempotently at startup.

pub const SCHEMA: &str = r#"
-- Chart of accounts
CREATE TABLE IF NOT EXISTS accounts (
    id UUID PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('asset', 'liability', 'equity', 'income', 'expense')),
    parent_id UUID REFERENCES accounts(id),
    level INTEGER NOT NULL DEFAULT 1,
    accepts_postings BOOLEAN NOT NULL DEFAULT TRUE,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_accounts_parent ON accounts(parent_id);

CREATE TABLE IF NOT EXISTS account_manuals (
    id UUID PRIMARY KEY,
    account_id UUID NOT NULL UNIQUE REFERENCES accounts(id) ON DELETE CASCADE,
    description TEXT NOT NULL,
    nature TEXT NOT NULL,
    classification TEXT,
    usage TEXT,
    examples TEXT,
    related_accounts TEXT,
    regulation TEXT,
    updated_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Accounting periods
CREATE TABLE IF NOT EXISTS periods (
    id UUID PRIMARY KEY,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    kind TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'open',
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CHECK (end_date > start_date)
);

-- Journal
CREATE TABLE IF NOT EXISTS transactions (
    id UUID PRIMARY KEY,
    date DATE NOT NULL,
    description TEXT NOT NULL,
    kind TEXT NOT NULL,
    category TEXT NOT NULL,
    currency TEXT NOT NULL DEFAULT 'USD',
    period_id UUID NOT NULL REFERENCES periods(id),
    reference TEXT,
    notes TEXT,
    created_by TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'posted',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_transactions_period ON transactions(period_id, date);

CREATE TABLE IF NOT EXISTS journal_lines (
    id UUID PRIMARY KEY,
    transaction_id UUID NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(18, 2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit NUMERIC(18, 2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_journal_lines_transaction ON journal_lines(transaction_id);
CREATE INDEX IF NOT EXISTS idx_journal_lines_account ON journal_lines(account_id);

-- Opening balances
CREATE TABLE IF NOT EXISTS opening_balances (
    id UUID PRIMARY KEY,
    period_id UUID NOT NULL REFERENCES periods(id),
    account_id UUID NOT NULL REFERENCES accounts(id),
    amount NUMERIC(18, 2) NOT NULL,
    side TEXT NOT NULL,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'active',
    created_by TEXT NOT NULL,
    updated_by TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS uq_opening_balances_active
    ON opening_balances(period_id, account_id) WHERE status = 'active';

-- Adjusting entries
CREATE TABLE IF NOT EXISTS adjustments (
    id UUID PRIMARY KEY,
    number TEXT NOT NULL UNIQUE,
    date DATE NOT NULL,
    description TEXT NOT NULL,
    kind TEXT NOT NULL,
    reason TEXT,
    period_id UUID NOT NULL REFERENCES periods(id),
    status TEXT NOT NULL DEFAULT 'active',
    approved_by TEXT,
    approved_at TIMESTAMPTZ,
    voided_by TEXT,
    voided_at TIMESTAMPTZ,
    created_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS adjustment_lines (
    id UUID PRIMARY KEY,
    adjustment_id UUID NOT NULL REFERENCES adjustments(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(18, 2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit NUMERIC(18, 2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_adjustment_lines_adjustment ON adjustment_lines(adjustment_id);
CREATE INDEX IF NOT EXISTS idx_adjustment_lines_account ON adjustment_lines(account_id);

-- Lines that count as movements: posted transactions and active adjusting entries
CREATE OR REPLACE VIEW ledger_lines AS
    SELECT
        'transaction' AS source,
        t.id AS entry_id,
        l.id AS line_id,
        l.position,
        l.account_id,
        t.period_id,
        t.date,
        t.reference,
        t.description,
        t.category,
        l.debit,
        l.credit
    FROM journal_lines l
    JOIN transactions t ON t.id = l.transaction_id
    WHERE t.status = 'posted'
    UNION ALL
    SELECT
        'adjustment' AS source,
        a.id AS entry_id,
        l.id AS line_id,
        l.position,
        l.account_id,
        a.period_id,
        a.date,
        a.number AS reference,
        a.description,
        a.kind AS category,
        l.debit,
        l.credit
    FROM adjustment_lines l
    JOIN adjustments a ON a.id = l.adjustment_id
    WHERE a.status = 'active';

-- Report history
CREATE TABLE IF NOT EXISTS trial_balances (
    id UUID PRIMARY KEY,
    period_id UUID NOT NULL REFERENCES periods(id),
    generated_on TIMESTAMPTZ NOT NULL,
    cutoff_date DATE NOT NULL,
    status TEXT NOT NULL,
    totals JSONB NOT NULL,
    row_data JSONB NOT NULL,
    generated_by TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_trial_balances_period ON trial_balances(period_id, generated_on DESC);

CREATE TABLE IF NOT EXISTS statements (
    id UUID PRIMARY KEY,
    period_id UUID NOT NULL REFERENCES periods(id),
    kind TEXT NOT NULL,
    content JSONB NOT NULL,
    summary JSONB NOT NULL,
    generated_by TEXT NOT NULL,
    generated_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_statements_period ON statements(period_id, generated_at DESC);

-- Company settings (single row)
CREATE TABLE IF NOT EXISTS company_settings (
    id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    name TEXT NOT NULL,
    tax_id TEXT NOT NULL DEFAULT '',
    address TEXT NOT NULL DEFAULT '',
    phone TEXT,
    email TEXT,
    currency TEXT NOT NULL DEFAULT 'USD',
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Invoicing settings (single row)
CREATE TABLE IF NOT EXISTS invoicing_settings (
    id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    receivables_prefix TEXT NOT NULL,
    sales_prefix TEXT NOT NULL,
    vat_payable_prefix TEXT NOT NULL,
    cash_prefix TEXT NOT NULL,
    default_vat_rate NUMERIC(5, 2) NOT NULL,
    updated_at TIMESTAMPTZ
);

-- Clients
CREATE TABLE IF NOT EXISTS clients (
    id UUID PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    last_name TEXT,
    trade_name TEXT,
    kind TEXT NOT NULL,
    tax_id TEXT,
    phone TEXT,
    email TEXT,
    address TEXT,
    category TEXT,
    credit_limit NUMERIC(18, 2) NOT NULL DEFAULT 0 CHECK (credit_limit >= 0),
    credit_days INTEGER NOT NULL DEFAULT 0 CHECK (credit_days >= 0),
    status TEXT NOT NULL DEFAULT 'active',
    created_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_clients_tax_id ON clients(tax_id);

-- Products
CREATE TABLE IF NOT EXISTS products (
    id UUID PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT,
    kind TEXT NOT NULL,
    category TEXT,
    sale_price NUMERIC(18, 4) NOT NULL CHECK (sale_price > 0),
    purchase_price NUMERIC(18, 4) NOT NULL DEFAULT 0 CHECK (purchase_price >= 0),
    applies_vat BOOLEAN NOT NULL DEFAULT TRUE,
    vat_rate NUMERIC(5, 2) NOT NULL DEFAULT 13 CHECK (vat_rate BETWEEN 0 AND 100),
    tracks_inventory BOOLEAN NOT NULL DEFAULT FALSE,
    stock NUMERIC(18, 3) NOT NULL DEFAULT 0 CHECK (stock >= 0),
    status TEXT NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Invoices
CREATE TABLE IF NOT EXISTS invoice_sequences (
    series TEXT PRIMARY KEY,
    last_value BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS invoices (
    id UUID PRIMARY KEY,
    number TEXT NOT NULL UNIQUE,
    series TEXT NOT NULL,
    issue_date DATE NOT NULL,
    due_date DATE NOT NULL,
    client_id UUID NOT NULL REFERENCES clients(id),
    client_name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'issued',
    applies_vat BOOLEAN NOT NULL DEFAULT TRUE,
    payment_method TEXT,
    payment_terms TEXT,
    notes TEXT,
    subtotal NUMERIC(18, 2) NOT NULL,
    discount NUMERIC(18, 2) NOT NULL,
    taxable NUMERIC(18, 2) NOT NULL,
    tax NUMERIC(18, 2) NOT NULL,
    total NUMERIC(18, 2) NOT NULL,
    transaction_ids UUID[] NOT NULL DEFAULT '{}',
    paid_on DATE,
    created_by TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CHECK (due_date >= issue_date)
);

CREATE INDEX IF NOT EXISTS idx_invoices_client ON invoices(client_id);
CREATE INDEX IF NOT EXISTS idx_invoices_status ON invoices(status, due_date);

CREATE TABLE IF NOT EXISTS invoice_lines (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    product_id UUID NOT NULL REFERENCES products(id),
    description TEXT NOT NULL,
    quantity NUMERIC(18, 3) NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(18, 4) NOT NULL CHECK (unit_price >= 0),
    gross NUMERIC(18, 2) NOT NULL,
    discount NUMERIC(18, 2) NOT NULL DEFAULT 0,
    subtotal NUMERIC(18, 2) NOT NULL,
    vat_rate NUMERIC(5, 2) NOT NULL,
    tax NUMERIC(18, 2) NOT NULL,
    total NUMERIC(18, 2) NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_invoice_lines_invoice ON invoice_lines(invoice_id);
"#;
