//! Clients, products and invoices.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use contaflow_accounting::Transaction;
use contaflow_core::{ClientId, InvoiceId, InvoiceLineId, ProductId, TransactionId};
use contaflow_invoicing::invoice::format_number;
use contaflow_invoicing::{
    Client, ClientKind, ClientStatus, Invoice, InvoiceLine, InvoiceStatus, InvoiceTotals,
    InvoicingSettings, Product, ProductKind, ProductStatus,
};

use super::accounting::insert_transaction_in;
use super::{PostgresStore, col, enum_col, expect_one, map_sqlx_error};
use crate::error::{StoreError, StoreResult};
use crate::store::{ClientStore, InvoiceBuilder, InvoiceStore, ProductStore};

const INVOICE_COLUMNS_SQL: &str = r#"
    SELECT id, number, series, issue_date, due_date, client_id, client_name, status, applies_vat,
           payment_method, payment_terms, notes, subtotal, discount, taxable, tax, total,
           transaction_ids, paid_on, created_by, created_at, updated_at
    FROM invoices
"#;

fn client_from_row(row: &PgRow) -> StoreResult<Client> {
    Ok(Client {
        id: ClientId::from_uuid(col(row, "id")?),
        code: col(row, "code")?,
        name: col(row, "name")?,
        last_name: col(row, "last_name")?,
        trade_name: col(row, "trade_name")?,
        kind: enum_col(row, "kind", ClientKind::parse)?,
        tax_id: col(row, "tax_id")?,
        phone: col(row, "phone")?,
        email: col(row, "email")?,
        address: col(row, "address")?,
        category: col(row, "category")?,
        credit_limit: col(row, "credit_limit")?,
        credit_days: col(row, "credit_days")?,
        status: enum_col(row, "status", ClientStatus::parse)?,
        created_by: col(row, "created_by")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    Ok(Product {
        id: ProductId::from_uuid(col(row, "id")?),
        code: col(row, "code")?,
        name: col(row, "name")?,
        description: col(row, "description")?,
        kind: enum_col(row, "kind", ProductKind::parse)?,
        category: col(row, "category")?,
        sale_price: col(row, "sale_price")?,
        purchase_price: col(row, "purchase_price")?,
        applies_vat: col(row, "applies_vat")?,
        vat_rate: col(row, "vat_rate")?,
        tracks_inventory: col(row, "tracks_inventory")?,
        stock: col(row, "stock")?,
        status: enum_col(row, "status", ProductStatus::parse)?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn invoice_from_row(row: &PgRow, lines: Vec<InvoiceLine>) -> StoreResult<Invoice> {
    let transaction_ids: Vec<Uuid> = col(row, "transaction_ids")?;
    Ok(Invoice {
        id: InvoiceId::from_uuid(col(row, "id")?),
        number: col(row, "number")?,
        series: col(row, "series")?,
        issue_date: col(row, "issue_date")?,
        due_date: col(row, "due_date")?,
        client_id: ClientId::from_uuid(col(row, "client_id")?),
        client_name: col(row, "client_name")?,
        status: enum_col(row, "status", InvoiceStatus::parse)?,
        applies_vat: col(row, "applies_vat")?,
        payment_method: col(row, "payment_method")?,
        payment_terms: col(row, "payment_terms")?,
        notes: col(row, "notes")?,
        totals: InvoiceTotals {
            subtotal: col(row, "subtotal")?,
            discount: col(row, "discount")?,
            taxable: col(row, "taxable")?,
            tax: col(row, "tax")?,
            total: col(row, "total")?,
        },
        lines,
        transaction_ids: transaction_ids.into_iter().map(TransactionId::from_uuid).collect(),
        paid_on: col(row, "paid_on")?,
        created_by: col(row, "created_by")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn transaction_uuids(invoice: &Invoice) -> Vec<Uuid> {
    invoice.transaction_ids.iter().map(|id| Uuid::from(*id)).collect()
}

impl PostgresStore {
    async fn invoice_lines_for(&self, ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<InvoiceLine>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, invoice_id, product_id, description, quantity, unit_price, gross, discount,
                   subtotal, vat_rate, tax, total
            FROM invoice_lines
            WHERE invoice_id = ANY($1)
            ORDER BY invoice_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("load_invoice_lines", e))?;

        let mut out: HashMap<Uuid, Vec<InvoiceLine>> = HashMap::new();
        for row in &rows {
            let owner: Uuid = col(row, "invoice_id")?;
            out.entry(owner).or_default().push(InvoiceLine {
                id: InvoiceLineId::from_uuid(col(row, "id")?),
                product_id: ProductId::from_uuid(col(row, "product_id")?),
                description: col(row, "description")?,
                quantity: col(row, "quantity")?,
                unit_price: col(row, "unit_price")?,
                gross: col(row, "gross")?,
                discount: col(row, "discount")?,
                subtotal: col(row, "subtotal")?,
                vat_rate: col(row, "vat_rate")?,
                tax: col(row, "tax")?,
                total: col(row, "total")?,
            });
        }
        Ok(out)
    }

    async fn invoices_from_rows(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Invoice>> {
        let ids = rows
            .iter()
            .map(|r| col::<Uuid>(r, "id"))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut lines = self.invoice_lines_for(&ids).await?;
        rows.iter()
            .zip(&ids)
            .map(|(row, id)| invoice_from_row(row, lines.remove(id).unwrap_or_default()))
            .collect()
    }

    async fn invoices_where_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Invoice>> {
        let sql = format!("{INVOICE_COLUMNS_SQL} WHERE id = ANY($1) ORDER BY number");
        let rows = sqlx::query(&sql)
            .bind(ids)
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("load_invoices", e))?;
        self.invoices_from_rows(rows).await
    }
}

async fn stored_invoice_status(db: &mut sqlx::PgConnection, id: InvoiceId) -> StoreResult<InvoiceStatus> {
    let row = sqlx::query("SELECT status FROM invoices WHERE id = $1")
        .bind(id.as_uuid())
        .fetch_optional(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("invoice_status", e))?
        .ok_or_else(|| StoreError::not_found(format!("invoice {id} not found")))?;
    enum_col(&row, "status", InvoiceStatus::parse)
}

#[async_trait::async_trait]
impl ClientStore for PostgresStore {
    #[instrument(skip(self, client), fields(code = %client.code), err)]
    async fn insert_client(&self, client: &Client) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO clients (
                id, code, name, last_name, trade_name, kind, tax_id, phone, email, address,
                category, credit_limit, credit_days, status, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(client.id.as_uuid())
        .bind(&client.code)
        .bind(&client.name)
        .bind(&client.last_name)
        .bind(&client.trade_name)
        .bind(client.kind.as_str())
        .bind(&client.tax_id)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.category)
        .bind(client.credit_limit)
        .bind(client.credit_days)
        .bind(client.status.as_str())
        .bind(&client.created_by)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_client", e))?;
        Ok(())
    }

    #[instrument(skip(self, client), fields(client_id = %client.id), err)]
    async fn update_client(&self, client: &Client) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET name = $2, last_name = $3, trade_name = $4, kind = $5, tax_id = $6, phone = $7,
                email = $8, address = $9, category = $10, credit_limit = $11, credit_days = $12,
                status = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(client.id.as_uuid())
        .bind(&client.name)
        .bind(&client.last_name)
        .bind(&client.trade_name)
        .bind(client.kind.as_str())
        .bind(&client.tax_id)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.category)
        .bind(client.credit_limit)
        .bind(client.credit_days)
        .bind(client.status.as_str())
        .bind(client.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_client", e))?;
        expect_one(result.rows_affected(), "client")
    }

    async fn get_client(&self, id: ClientId) -> StoreResult<Option<Client>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, last_name, trade_name, kind, tax_id, phone, email, address,
                   category, credit_limit, credit_days, status, created_by, created_at, updated_at
            FROM clients WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_client", e))?;
        row.as_ref().map(client_from_row).transpose()
    }

    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, last_name, trade_name, kind, tax_id, phone, email, address,
                   category, credit_limit, credit_days, status, created_by, created_at, updated_at
            FROM clients ORDER BY code
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_clients", e))?;
        rows.iter().map(client_from_row).collect()
    }

    async fn client_codes(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT code FROM clients")
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("client_codes", e))?;
        rows.iter().map(|r| col(r, "code")).collect()
    }

    async fn tax_id_in_use(&self, tax_id: &str, except: Option<ClientId>) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM clients
                WHERE tax_id = $1 AND status = 'active' AND ($2::uuid IS NULL OR id <> $2)
            ) AS found
            "#,
        )
        .bind(tax_id)
        .bind(except.map(Uuid::from))
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("tax_id_in_use", e))?;
        col(&row, "found")
    }
}

#[async_trait::async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self, product), fields(code = %product.code), err)]
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, kind, category, sale_price, purchase_price,
                applies_vat, vat_rate, tracks_inventory, stock, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.kind.as_str())
        .bind(&product.category)
        .bind(product.sale_price)
        .bind(product.purchase_price)
        .bind(product.applies_vat)
        .bind(product.vat_rate)
        .bind(product.tracks_inventory)
        .bind(product.stock)
        .bind(product.status.as_str())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, kind = $4, category = $5, sale_price = $6,
                purchase_price = $7, applies_vat = $8, vat_rate = $9, tracks_inventory = $10,
                stock = $11, status = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.kind.as_str())
        .bind(&product.category)
        .bind(product.sale_price)
        .bind(product.purchase_price)
        .bind(product.applies_vat)
        .bind(product.vat_rate)
        .bind(product.tracks_inventory)
        .bind(product.stock)
        .bind(product.status.as_str())
        .bind(product.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;
        expect_one(result.rows_affected(), "product")
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, description, kind, category, sale_price, purchase_price,
                   applies_vat, vat_rate, tracks_inventory, stock, status, created_at, updated_at
            FROM products WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn get_product_by_code(&self, code: &str) -> StoreResult<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, description, kind, category, sale_price, purchase_price,
                   applies_vat, vat_rate, tracks_inventory, stock, status, created_at, updated_at
            FROM products WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_product_by_code", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, description, kind, category, sale_price, purchase_price,
                   applies_vat, vat_rate, tracks_inventory, stock, status, created_at, updated_at
            FROM products ORDER BY code
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;
        rows.iter().map(product_from_row).collect()
    }
}

#[async_trait::async_trait]
impl InvoiceStore for PostgresStore {
    #[instrument(skip(self, build), err)]
    async fn create_invoice(&self, series: &str, build: InvoiceBuilder) -> StoreResult<Invoice> {
        let mut db = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("INSERT INTO invoice_sequences (series, last_value) VALUES ($1, 0) ON CONFLICT (series) DO NOTHING")
            .bind(series)
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("ensure_invoice_sequence", e))?;

        // Row lock serializes numbering per series until commit.
        let row = sqlx::query("SELECT last_value FROM invoice_sequences WHERE series = $1 FOR UPDATE")
            .bind(series)
            .fetch_one(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("lock_invoice_sequence", e))?;
        let next = col::<i64>(&row, "last_value")? + 1;

        // Dropping `db` on error rolls back and leaves the sequence untouched.
        let (invoice, transaction) = build(format_number(series, next))?;

        if let Some(transaction) = &transaction {
            insert_transaction_in(&mut db, transaction).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, number, series, issue_date, due_date, client_id, client_name, status, applies_vat,
                payment_method, payment_terms, notes, subtotal, discount, taxable, tax, total,
                transaction_ids, paid_on, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(&invoice.number)
        .bind(&invoice.series)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(invoice.client_id.as_uuid())
        .bind(&invoice.client_name)
        .bind(invoice.status.as_str())
        .bind(invoice.applies_vat)
        .bind(&invoice.payment_method)
        .bind(&invoice.payment_terms)
        .bind(&invoice.notes)
        .bind(invoice.totals.subtotal)
        .bind(invoice.totals.discount)
        .bind(invoice.totals.taxable)
        .bind(invoice.totals.tax)
        .bind(invoice.totals.total)
        .bind(transaction_uuids(&invoice))
        .bind(invoice.paid_on)
        .bind(&invoice.created_by)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("insert_invoice", e))?;

        for (position, line) in invoice.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_lines (
                    id, invoice_id, position, product_id, description, quantity, unit_price,
                    gross, discount, subtotal, vat_rate, tax, total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(invoice.id.as_uuid())
            .bind(position as i32)
            .bind(line.product_id.as_uuid())
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.gross)
            .bind(line.discount)
            .bind(line.subtotal)
            .bind(line.vat_rate)
            .bind(line.tax)
            .bind(line.total)
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("insert_invoice_line", e))?;
        }

        sqlx::query("UPDATE invoice_sequences SET last_value = $2 WHERE series = $1")
            .bind(series)
            .bind(next)
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("advance_invoice_sequence", e))?;

        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        debug!(number = %invoice.number, "invoice stored");
        Ok(invoice)
    }

    async fn get_invoice(&self, id: InvoiceId) -> StoreResult<Option<Invoice>> {
        let uuid: Uuid = id.into();
        Ok(self.invoices_where_ids(&[uuid]).await?.into_iter().next())
    }

    async fn list_invoices(&self) -> StoreResult<Vec<Invoice>> {
        let sql = format!("{INVOICE_COLUMNS_SQL} ORDER BY issue_date DESC, number DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(|e| map_sqlx_error("list_invoices", e))?;
        self.invoices_from_rows(rows).await
    }

    #[instrument(skip(self, invoice, payment), fields(number = %invoice.number), err)]
    async fn record_payment(&self, invoice: &Invoice, payment: Option<&Transaction>) -> StoreResult<()> {
        let mut db = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2, paid_on = $3, transaction_ids = $4, updated_at = $5
            WHERE id = $1 AND status IN ('issued', 'overdue')
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.status.as_str())
        .bind(invoice.paid_on)
        .bind(transaction_uuids(invoice))
        .bind(invoice.updated_at)
        .execute(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("record_payment", e))?;

        if result.rows_affected() == 0 {
            // Distinguish a missing invoice from one paid or voided meanwhile.
            stored_invoice_status(&mut db, invoice.id).await?;
            return Err(StoreError::conflict(format!(
                "invoice {} is no longer open",
                invoice.number
            )));
        }

        if let Some(payment) = payment {
            insert_transaction_in(&mut db, payment).await?;
        }

        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, invoice), fields(number = %invoice.number), err)]
    async fn void_invoice(&self, invoice: &Invoice) -> StoreResult<()> {
        let mut db = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2, notes = $3, updated_at = $4
            WHERE id = $1 AND status <> 'voided'
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.status.as_str())
        .bind(&invoice.notes)
        .bind(invoice.updated_at)
        .execute(&mut *db)
        .await
        .map_err(|e| map_sqlx_error("void_invoice", e))?;

        if result.rows_affected() == 0 {
            stored_invoice_status(&mut db, invoice.id).await?;
            return Err(StoreError::conflict(format!(
                "invoice {} is already voided",
                invoice.number
            )));
        }

        sqlx::query("UPDATE transactions SET status = 'voided' WHERE id = ANY($1)")
            .bind(transaction_uuids(invoice))
            .execute(&mut *db)
            .await
            .map_err(|e| map_sqlx_error("void_invoice_transactions", e))?;

        db.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, now), err)]
    async fn mark_overdue(&self, as_of: NaiveDate, now: DateTime<Utc>) -> StoreResult<Vec<Invoice>> {
        let rows = sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'overdue', updated_at = $2
            WHERE status = 'issued' AND due_date < $1
            RETURNING id
            "#,
        )
        .bind(as_of)
        .bind(now)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("mark_overdue", e))?;

        let ids = rows
            .iter()
            .map(|r| col::<Uuid>(r, "id"))
            .collect::<StoreResult<Vec<_>>>()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.invoices_where_ids(&ids).await
    }

    async fn get_invoicing_settings(&self) -> StoreResult<Option<InvoicingSettings>> {
        let row = sqlx::query(
            r#"
            SELECT receivables_prefix, sales_prefix, vat_payable_prefix, cash_prefix,
                   default_vat_rate, updated_at
            FROM invoicing_settings WHERE id = 1
            "#,
        )
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("get_invoicing_settings", e))?;
        row.as_ref()
            .map(|row| {
                Ok(InvoicingSettings {
                    receivables_prefix: col(row, "receivables_prefix")?,
                    sales_prefix: col(row, "sales_prefix")?,
                    vat_payable_prefix: col(row, "vat_payable_prefix")?,
                    cash_prefix: col(row, "cash_prefix")?,
                    default_vat_rate: col(row, "default_vat_rate")?,
                    updated_at: col(row, "updated_at")?,
                })
            })
            .transpose()
    }

    #[instrument(skip(self, settings), err)]
    async fn save_invoicing_settings(&self, settings: &InvoicingSettings) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoicing_settings
                (id, receivables_prefix, sales_prefix, vat_payable_prefix, cash_prefix, default_vat_rate, updated_at)
            VALUES (1, $1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                receivables_prefix = EXCLUDED.receivables_prefix,
                sales_prefix = EXCLUDED.sales_prefix,
                vat_payable_prefix = EXCLUDED.vat_payable_prefix,
                cash_prefix = EXCLUDED.cash_prefix,
                default_vat_rate = EXCLUDED.default_vat_rate,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&settings.receivables_prefix)
        .bind(&settings.sales_prefix)
        .bind(&settings.vat_payable_prefix)
        .bind(&settings.cash_prefix)
        .bind(settings.default_vat_rate)
        .bind(settings.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("save_invoicing_settings", e))?;
        Ok(())
    }
}
