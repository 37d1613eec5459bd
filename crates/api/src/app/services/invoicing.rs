//! Clients, products, invoices and receivables.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use contaflow_accounting::period::open_period_for;
use contaflow_accounting::{Account, Transaction};
use contaflow_core::{ClientId, DomainError, InvoiceId, ProductId};
use contaflow_infra::store::{
    AccountStore, ClientStore, InvoiceBuilder, InvoiceStore, PeriodStore, ProductStore,
};
use contaflow_invoicing::client::next_code;
use contaflow_invoicing::posting::{payment_entry, sale_entry};
use contaflow_invoicing::reports::{receivables_aging, sales_report};
use contaflow_invoicing::settings::check_system;
use contaflow_invoicing::{
    AgingReport, Client, ClientFilter, ClientStatus, ClientUpdate, Invoice, InvoiceFilter,
    InvoicingSettings, InvoicingSettingsUpdate, NewClient, NewInvoice, NewProduct, Product,
    ProductFilter, ProductStatus, ProductUpdate, SalesReport, StockMovement, SystemCheck,
};

use super::{AppServices, now};
use crate::app::errors::{ServiceError, ServiceResult};

impl AppServices {
    pub async fn create_client(&self, input: NewClient, actor: &str) -> ServiceResult<Client> {
        let codes = self.store().client_codes().await?;
        let generated = next_code(codes.iter().map(String::as_str));
        let tax_id_taken = match input.tax_id.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tax_id) => self.store().tax_id_in_use(tax_id, None).await?,
            None => false,
        };
        let client = Client::create(input, generated, tax_id_taken, actor, now())?;
        self.store().insert_client(&client).await?;
        info!(client_id = %client.id, code = %client.code, "client created");
        Ok(client)
    }

    pub async fn list_clients(&self, filter: &ClientFilter) -> ServiceResult<Vec<Client>> {
        Ok(filter.apply(self.store().list_clients().await?))
    }

    pub async fn get_client(&self, id: ClientId) -> ServiceResult<Client> {
        self.store()
            .get_client(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("client {id}")))
    }

    pub async fn update_client(&self, id: ClientId, update: ClientUpdate) -> ServiceResult<Client> {
        let mut client = self.get_client(id).await?;
        let tax_id_taken = match update.tax_id.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(tax_id) => self.store().tax_id_in_use(tax_id, Some(id)).await?,
            None => false,
        };
        client.apply_update(update, tax_id_taken, now())?;
        self.store().update_client(&client).await?;
        Ok(client)
    }

    pub async fn set_client_status(&self, id: ClientId, status: ClientStatus) -> ServiceResult<Client> {
        let mut client = self.get_client(id).await?;
        if status == ClientStatus::Active {
            if let Some(tax_id) = client.tax_id.as_deref() {
                if self.store().tax_id_in_use(tax_id, Some(id)).await? {
                    return Err(DomainError::conflict(format!(
                        "tax id {tax_id} is used by another active client"
                    ))
                    .into());
                }
            }
        }
        client.set_status(status, now());
        self.store().update_client(&client).await?;
        info!(client_id = %id, status = status.as_str(), "client status changed");
        Ok(client)
    }

    /// Soft delete: the client becomes inactive.
    pub async fn delete_client(&self, id: ClientId) -> ServiceResult<Client> {
        self.set_client_status(id, ClientStatus::Inactive).await
    }

    pub async fn create_product(&self, mut input: NewProduct) -> ServiceResult<Product> {
        if input.vat_rate.is_none() {
            input.vat_rate = Some(self.invoicing_settings().await?.default_vat_rate);
        }
        let product = Product::create(input, now())?;
        self.store().insert_product(&product).await?;
        info!(product_id = %product.id, code = %product.code, "product created");
        Ok(product)
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> ServiceResult<Vec<Product>> {
        Ok(filter.apply(self.store().list_products().await?))
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        self.store()
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {id}")))
    }

    pub async fn get_product_by_code(&self, code: &str) -> ServiceResult<Product> {
        self.store()
            .get_product_by_code(code.trim())
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("product {code}")))
    }

    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> ServiceResult<Product> {
        let mut product = self.get_product(id).await?;
        product.apply_update(update, now())?;
        self.store().update_product(&product).await?;
        Ok(product)
    }

    pub async fn set_product_status(&self, id: ProductId, status: ProductStatus) -> ServiceResult<Product> {
        let mut product = self.get_product(id).await?;
        product.set_status(status, now());
        self.store().update_product(&product).await?;
        info!(product_id = %id, status = status.as_str(), "product status changed");
        Ok(product)
    }

    pub async fn adjust_stock(
        &self,
        id: ProductId,
        movement: StockMovement,
        quantity: Decimal,
    ) -> ServiceResult<Product> {
        let mut product = self.get_product(id).await?;
        product.adjust_stock(movement, quantity, now())?;
        self.store().update_product(&product).await?;
        info!(product_id = %id, stock = %product.stock, "stock adjusted");
        Ok(product)
    }

    /// Issue an invoice. With `post_to_ledger`, the sale is journaled in the
    /// open period containing the issue date, atomically with the invoice.
    pub async fn create_invoice(
        &self,
        input: NewInvoice,
        post_to_ledger: bool,
        actor: &str,
    ) -> ServiceResult<Invoice> {
        let client = self
            .store()
            .get_client(input.client_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("client {}", input.client_id)))?;

        let mut products: HashMap<ProductId, Product> = HashMap::new();
        for line in &input.lines {
            if products.contains_key(&line.product_id) {
                continue;
            }
            let product = self.get_product(line.product_id).await?;
            products.insert(product.id, product);
        }

        let created_at = now();
        let draft = Invoice::draft(input, &self.invoice_series, &client, &products, actor, created_at)?;

        let ledger = if post_to_ledger {
            let periods = self.store().list_periods().await?;
            let period = open_period_for(&periods, draft.issue_date)
                .cloned()
                .ok_or_else(|| {
                    DomainError::validation(format!(
                        "no open period contains the issue date {}",
                        draft.issue_date
                    ))
                })?;
            let accounts = self.store().list_accounts().await?;
            Some((period, accounts))
        } else {
            None
        };

        let settings = self.invoicing_settings().await?;
        let actor_name = actor.to_string();
        let build: InvoiceBuilder = Box::new(move |number: String| {
            let mut invoice = draft.into_invoice(number);
            let posting = match ledger {
                Some((period, accounts)) => {
                    let entry = sale_entry(&invoice, period.id, &settings, &accounts)?;
                    let by_id: HashMap<_, Account> = accounts.into_iter().map(|a| (a.id, a)).collect();
                    let transaction = Transaction::post(entry, &period, &by_id, &actor_name, created_at)?;
                    invoice.transaction_ids.push(transaction.id);
                    Some(transaction)
                }
                None => None,
            };
            Ok((invoice, posting))
        });

        let invoice = self.store().create_invoice(&self.invoice_series, build).await?;
        info!(
            invoice_id = %invoice.id,
            number = %invoice.number,
            total = %invoice.totals.total,
            posted = !invoice.transaction_ids.is_empty(),
            "invoice issued"
        );
        Ok(invoice)
    }

    pub async fn list_invoices(&self, filter: &InvoiceFilter) -> ServiceResult<Vec<Invoice>> {
        Ok(filter.apply(self.store().list_invoices().await?))
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        self.store()
            .get_invoice(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("invoice {id}")))
    }

    /// Mark an invoice paid. Invoices that were journaled at issue also get
    /// a cash receipt entry.
    pub async fn register_payment(
        &self,
        id: InvoiceId,
        paid_on: Option<NaiveDate>,
        actor: &str,
    ) -> ServiceResult<Invoice> {
        let mut invoice = self.get_invoice(id).await?;
        let at = now();
        let paid_on = paid_on.unwrap_or_else(|| at.date_naive());
        invoice.register_payment(paid_on, at)?;

        let payment = if invoice.transaction_ids.is_empty() {
            None
        } else {
            let periods = self.store().list_periods().await?;
            let period = open_period_for(&periods, paid_on).ok_or_else(|| {
                DomainError::validation(format!("no open period contains the payment date {paid_on}"))
            })?;
            let accounts = self.store().list_accounts().await?;
            let settings = self.invoicing_settings().await?;
            let entry = payment_entry(&invoice, paid_on, period.id, &settings, &accounts)?;
            let by_id: HashMap<_, Account> = accounts.into_iter().map(|a| (a.id, a)).collect();
            let transaction = Transaction::post(entry, period, &by_id, actor, at)?;
            invoice.transaction_ids.push(transaction.id);
            Some(transaction)
        };

        self.store().record_payment(&invoice, payment.as_ref()).await?;
        info!(invoice_id = %id, number = %invoice.number, %paid_on, "invoice paid");
        Ok(invoice)
    }

    pub async fn void_invoice(&self, id: InvoiceId, reason: &str) -> ServiceResult<Invoice> {
        let mut invoice = self.get_invoice(id).await?;
        invoice.void(reason, now())?;
        self.store().void_invoice(&invoice).await?;
        warn!(
            invoice_id = %id,
            number = %invoice.number,
            transactions = invoice.transaction_ids.len(),
            "invoice voided"
        );
        Ok(invoice)
    }

    pub async fn mark_overdue_invoices(&self, as_of: Option<NaiveDate>) -> ServiceResult<Vec<Invoice>> {
        let at = now();
        let as_of = as_of.unwrap_or_else(|| at.date_naive());
        let changed = self.store().mark_overdue(as_of, at).await?;
        info!(%as_of, count = changed.len(), "overdue invoices marked");
        Ok(changed)
    }

    pub async fn sales_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        client_id: Option<ClientId>,
    ) -> ServiceResult<SalesReport> {
        if from > to {
            return Err(ServiceError::validation("'from' must not be after 'to'"));
        }
        let invoices = self.store().list_invoices().await?;
        Ok(sales_report(from, to, client_id, &invoices))
    }

    pub async fn receivables_aging(&self, as_of: Option<NaiveDate>) -> ServiceResult<AgingReport> {
        let as_of = as_of.unwrap_or_else(|| now().date_naive());
        let invoices = self.store().list_invoices().await?;
        Ok(receivables_aging(as_of, &invoices))
    }

    /// Stored invoicing settings, or the defaults when none were saved yet.
    pub async fn invoicing_settings(&self) -> ServiceResult<InvoicingSettings> {
        Ok(self.store().get_invoicing_settings().await?.unwrap_or_default())
    }

    pub async fn update_invoicing_settings(
        &self,
        update: InvoicingSettingsUpdate,
    ) -> ServiceResult<InvoicingSettings> {
        let mut settings = self.invoicing_settings().await?;
        settings.apply_update(update, now())?;
        self.store().save_invoicing_settings(&settings).await?;
        info!(
            receivables = %settings.receivables_prefix,
            sales = %settings.sales_prefix,
            vat_rate = %settings.default_vat_rate,
            "invoicing settings updated"
        );
        Ok(settings)
    }

    /// Report whether invoices can be issued and posted right now.
    pub async fn system_check(&self) -> ServiceResult<SystemCheck> {
        let company = self.company_settings().await?;
        let settings = self.invoicing_settings().await?;
        let accounts = self.store().list_accounts().await?;
        let periods = self.store().list_periods().await?;
        let check = check_system(&company, &settings, &accounts, &periods, now().date_naive());
        if !check.ready {
            warn!(errors = check.error_count, "system is not ready for invoicing");
        }
        Ok(check)
    }
}
