//! Command handlers. Each returns the text to print.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use onroad_core::format::{format_indian_price, format_lakh_price};
use onroad_core::validation::{parse_amount, validate_location};
use onroad_core::{EnergyType, PriceBreakup, PriceItem, PriceQuote, PriceRequest, TaxRateEntry};
use onroad_engine::{
    LocationContext, MemoryLocationStore, PricingConfig, PricingContext, StorageArea,
    StorageLocationStore,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cli::{Commands, LocationCommands};
use crate::error::{CliError, CliResult};

/// Everything a command needs, opened once per invocation.
pub struct App {
    config: PricingConfig,
    area: Arc<StorageArea>,
    ctx: PricingContext,
}

impl App {
    pub fn open(config: PricingConfig, storage: Option<PathBuf>) -> CliResult<Self> {
        let path = storage
            .or_else(|| config.storage_path())
            .ok_or(CliError::NoStoragePath)?;
        debug!(?path, "Using location storage");

        let area = Arc::new(StorageArea::json_file(path));
        let store = StorageLocationStore::new(Arc::clone(&area), config.storage_key());
        let ctx = PricingContext::from_config(&config, Arc::new(store));

        Ok(App { config, area, ctx })
    }

    pub fn run(&self, command: &Commands) -> CliResult<String> {
        match command {
            Commands::Quote {
                price,
                fuel,
                location,
                breakup,
                json,
            } => self.quote(price, fuel, location.as_deref(), *breakup, *json),
            Commands::Batch { input } => self.batch(input),
            Commands::Location { action } => self.location(action),
            Commands::Rates { region } => Ok(self.rates(region.as_deref())),
        }
    }

    fn quote(
        &self,
        price: &str,
        fuel: &str,
        location: Option<&str>,
        breakup: bool,
        json: bool,
    ) -> CliResult<String> {
        let base = parse_amount(price)?;
        let energy = EnergyType::from_tag(fuel);

        let ctx = match location {
            Some(text) => {
                let selection = validate_location(text)?;
                let store = MemoryLocationStore::with_value(selection.to_storage_string());
                self.ctx.with_location(LocationContext::with_default(
                    Arc::new(store),
                    self.config.default_selection(),
                ))
            }
            None => self.ctx.clone(),
        };

        let mut request = PriceRequest::new(base, energy);
        if breakup {
            request = request.with_breakup();
        }
        let quote = ctx.quote(&request);
        let details = breakup.then(|| ctx.engine().breakup(base, &quote.region, energy));

        if json {
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct QuoteOutput<'a> {
                quote: &'a PriceQuote,
                #[serde(skip_serializing_if = "Option::is_none")]
                breakup: Option<&'a PriceBreakup>,
            }
            let output = QuoteOutput {
                quote: &quote,
                breakup: details.as_ref(),
            };
            return Ok(serde_json::to_string_pretty(&output).map_err(onroad_engine::EngineError::from)?);
        }

        Ok(render_quote(&quote, details.as_ref(), &self.rate_label(&quote.region, energy)))
    }

    fn rate_label(&self, region: &str, energy: EnergyType) -> String {
        self.ctx.engine().table().percentage_for(region, energy).to_string()
    }

    fn batch(&self, input: &Path) -> CliResult<String> {
        let raw = read_input(input)?;
        let rows: Vec<BatchRow> = serde_json::from_str(&raw)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(PriceItem::new(row.id, parse_amount(&row.price)?, row.fuel.as_str()));
        }

        let quotes: BTreeMap<String, PriceQuote> = self.ctx.batch_price(&items).into_iter().collect();
        info!(items = items.len(), unique = quotes.len(), "Batch priced");

        Ok(serde_json::to_string_pretty(&quotes).map_err(onroad_engine::EngineError::from)?)
    }

    fn location(&self, action: &LocationCommands) -> CliResult<String> {
        match action {
            LocationCommands::Show => {
                let snapshot = self.ctx.current_location();
                let mode = if snapshot.is_set { "On-Road" } else { "default, Ex-Showroom" };
                Ok(format!("{} ({})", snapshot.selection, mode))
            }
            LocationCommands::Set { location } => {
                let selection = validate_location(location)?;
                self.ctx.select_location(&selection)?;
                Ok(format!("Location set to {}", selection))
            }
            LocationCommands::Clear => {
                self.area.remove(self.config.storage_key()).map_err(CliError::from)?;
                info!("Stored location cleared");
                Ok(format!("Location cleared; prices use {}", self.config.default_selection()))
            }
        }
    }

    fn rates(&self, region: Option<&str>) -> String {
        let table = self.ctx.engine().table();
        let entries: Vec<&TaxRateEntry> = match region {
            Some(name) => vec![table.entry_for(name)],
            None => table.regions().collect(),
        };

        let mut out = format!(
            "{:<28} {:>8} {:>8} {:>8} {:>8}\n",
            "Region", "Petrol", "Diesel", "CNG", "Electric"
        );
        for entry in entries {
            let marker = if entry.region == table.default_region() { " *" } else { "" };
            out.push_str(&format!(
                "{:<28} {:>8} {:>8} {:>8} {:>8}\n",
                format!("{}{}", entry.region, marker),
                entry.petrol.to_string(),
                entry.diesel.to_string(),
                entry.cng.to_string(),
                entry.electric.to_string(),
            ));
        }
        out.push_str("* default for unlisted regions");
        out
    }
}

#[derive(Debug, Deserialize)]
struct BatchRow {
    id: String,
    price: String,
    #[serde(default = "default_fuel")]
    fuel: String,
}

fn default_fuel() -> String {
    "Petrol".to_string()
}

fn read_input(path: &Path) -> CliResult<String> {
    let input_error = |e: std::io::Error| CliError::Input {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).map_err(input_error)?;
        Ok(raw)
    } else {
        std::fs::read_to_string(path).map_err(input_error)
    }
}

fn render_quote(quote: &PriceQuote, breakup: Option<&PriceBreakup>, rate: &str) -> String {
    let mut out = String::new();
    let line = |out: &mut String, label: &str, amount: onroad_core::Money| {
        out.push_str(&format!("{:<32} {:>16}\n", label, amount.to_string()));
    };

    line(&mut out, "Ex-showroom price", quote.base_price);
    if let Some(b) = breakup {
        line(&mut out, &format!("Registration ({})", rate), b.region_charge);
        line(&mut out, "Road safety cess", b.region_safety_charge);
        line(&mut out, "Insurance", b.insurance_charge);
        line(&mut out, "TCS", b.source_tax_charge);
        line(&mut out, "Handling charges", b.fixed_charges.admin);
        line(&mut out, "Hypothecation", b.fixed_charges.lien_registration);
        line(&mut out, "FASTag", b.fixed_charges.tag_fee);
    }

    out.push_str(&format!(
        "{} price in {}: ₹{} ({})",
        quote.label(),
        quote.city,
        format_indian_price(quote.total_price),
        format_lakh_price(quote.total_price)
    ));
    out
}
