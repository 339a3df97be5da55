use std::fmt;
use std::io::Read;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{Catalog, CustomerId, Item, LogEntry, Points, parse_price};

/// Entries parsed from a day log, plus the records that could not be parsed.
///
/// Records listed in `errors` never reach the ledger. This is different from the
/// ledger's own error log, which receives well-formed entries that lack an item list.
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub entries: Vec<LogEntry>,
    pub errors: Vec<ImportError>,
}

/// A record that could not be turned into a log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    /// 1-based CSV line, or 1-based position in a JSON array
    pub record: usize,
    pub field: Option<String>,
    pub error: String,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "record {} ({}): {}", self.record, field, self.error),
            None => write!(f, "record {}: {}", self.record, self.error),
        }
    }
}

/// An item in a JSON log: either fully priced or a bare id priced from the catalog
#[derive(Deserialize)]
#[serde(untagged)]
enum RawItem {
    Priced(Item),
    Id(String),
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    customer_id: Option<CustomerId>,
    #[serde(default)]
    points_redeemed: Option<Points>,
    #[serde(default)]
    purchased_items: Option<Vec<RawItem>>,
}

/// Parses day logs into ledger entries, resolving item ids against a catalog.
pub struct Importer<'a> {
    catalog: &'a Catalog,
}

impl<'a> Importer<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Import a JSON array of log entries.
    ///
    /// ```json
    /// [{"customer_id": "c1", "points_redeemed": 100,
    ///   "purchased_items": [{"id": "banana", "unit_price": "50.00"}, "apple"]}]
    /// ```
    pub fn import_log_json<R: Read>(&self, reader: R) -> Result<ImportResult> {
        let records: Vec<serde_json::Value> =
            serde_json::from_reader(reader).context("Day log must be a JSON array")?;
        let mut result = ImportResult::default();

        for (index, value) in records.into_iter().enumerate() {
            let record = index + 1;

            let raw: RawEntry = match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    result.errors.push(ImportError {
                        record,
                        field: None,
                        error: format!("Invalid entry: {}", e),
                    });
                    continue;
                }
            };

            let items = match raw.purchased_items {
                Some(raw_items) => match self.resolve_items(raw_items) {
                    Ok(items) => Some(items),
                    Err(e) => {
                        result.errors.push(ImportError {
                            record,
                            field: Some("purchased_items".to_string()),
                            error: e,
                        });
                        continue;
                    }
                },
                None => None,
            };

            match build_entry(raw.customer_id, raw.points_redeemed, items) {
                Ok(entry) => result.entries.push(entry),
                Err(e) => result.errors.push(ImportError { record, ..e }),
            }
        }

        log_result("json", &result);
        Ok(result)
    }

    /// Import a CSV day log with header `customer_id,points_redeemed,items`.
    ///
    /// `items` is a `;`-separated list of catalog ids, one per unit. An empty
    /// cell means the field is absent.
    pub fn import_log_csv<R: Read>(&self, reader: R) -> Result<ImportResult> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut result = ImportResult::default();

        for (line_num, row) in csv_reader.records().enumerate() {
            let record = line_num + 2; // +2 for header and 0-indexing

            let row = match row {
                Ok(r) => r,
                Err(e) => {
                    result.errors.push(ImportError {
                        record,
                        field: None,
                        error: format!("CSV parse error: {}", e),
                    });
                    continue;
                }
            };

            let customer_id = non_empty(row.get(0)).map(str::to_string);

            let points_redeemed = match non_empty(row.get(1)).map(str::parse::<Points>) {
                None => None,
                Some(Ok(points)) => Some(points),
                Some(Err(e)) => {
                    result.errors.push(ImportError {
                        record,
                        field: Some("points_redeemed".to_string()),
                        error: format!("Invalid points: {}", e),
                    });
                    continue;
                }
            };

            let items = match non_empty(row.get(2)) {
                None => None,
                Some(cell) => {
                    let ids = cell
                        .split(';')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(|id| RawItem::Id(id.to_string()))
                        .collect();
                    match self.resolve_items(ids) {
                        Ok(items) => Some(items),
                        Err(e) => {
                            result.errors.push(ImportError {
                                record,
                                field: Some("items".to_string()),
                                error: e,
                            });
                            continue;
                        }
                    }
                }
            };

            match build_entry(customer_id, points_redeemed, items) {
                Ok(entry) => result.entries.push(entry),
                Err(e) => result.errors.push(ImportError { record, ..e }),
            }
        }

        log_result("csv", &result);
        Ok(result)
    }

    fn resolve_items(&self, raw_items: Vec<RawItem>) -> Result<Vec<Item>, String> {
        raw_items
            .into_iter()
            .map(|raw| match raw {
                RawItem::Priced(item) => Ok(item),
                RawItem::Id(id) => self
                    .catalog
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| format!("Unknown item: {}", id)),
            })
            .collect()
    }
}

/// Load a catalog CSV with header `id,price`. Prices use the usual money format ("50.00").
pub fn read_catalog_csv<R: Read>(reader: R) -> Result<Catalog> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut catalog = Catalog::new();

    for (line_num, row) in csv_reader.records().enumerate() {
        let line = line_num + 2;
        let row = row.with_context(|| format!("Catalog line {}", line))?;

        let Some(id) = non_empty(row.get(0)) else {
            bail!("Catalog line {}: missing item id", line);
        };
        let price = parse_price(row.get(1).unwrap_or(""))
            .with_context(|| format!("Catalog line {}: invalid price for {}", line, id))?;

        if catalog.insert(Item::new(id, price)).is_some() {
            bail!("Catalog line {}: duplicate item id {}", line, id);
        }
    }

    debug!(items = catalog.len(), "loaded catalog");
    Ok(catalog)
}

fn build_entry(
    customer_id: Option<CustomerId>,
    points_redeemed: Option<Points>,
    purchased_items: Option<Vec<Item>>,
) -> Result<LogEntry, ImportError> {
    if let Some(points) = points_redeemed.filter(|p| *p < 0) {
        return Err(ImportError {
            record: 0,
            field: Some("points_redeemed".to_string()),
            error: format!("Points redeemed must not be negative, got {}", points),
        });
    }

    Ok(LogEntry {
        customer_id: customer_id.filter(|id| !id.trim().is_empty()),
        points_redeemed,
        purchased_items,
    })
}

fn non_empty(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|s| !s.is_empty())
}

fn log_result(format: &str, result: &ImportResult) {
    if result.errors.is_empty() {
        debug!(format, entries = result.entries.len(), "day log imported");
    } else {
        warn!(
            format,
            entries = result.entries.len(),
            skipped = result.errors.len(),
            "day log imported with unreadable records"
        );
    }
}
