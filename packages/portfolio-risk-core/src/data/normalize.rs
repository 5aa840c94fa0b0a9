//! Resolution of a raw price table into a canonical price matrix.
//!
//! Sources label prices inconsistently: a single-instrument result usually has
//! flat columns (`Open`, `Close`, `Adj Close`, ...), a multi-instrument result
//! has two-level keys nested either `(field, instrument)` or
//! `(instrument, field)`. The price field is picked by [`PRICE_FIELD_RULES`],
//! evaluated top to bottom; the first rule that finds columns wins.

use super::matrix::CanonicalPriceMatrix;
use super::raw::{parse_index_date, ColumnKey, ColumnScheme, ColumnValues, RawTable};
use crate::{Error, Result};
use chrono::NaiveDate;

/// Position of the field name inside a two-level column key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// `(field, instrument)`
    Outer,
    /// `(instrument, field)`
    Inner,
}

impl Level {
    fn index(self) -> usize {
        match self {
            Level::Outer => 0,
            Level::Inner => 1,
        }
    }
}

/// One entry of the price-field precedence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFieldRule {
    /// Two-level keys: every column whose name at `level` equals `field`.
    Composite { field: &'static str, level: Level },
    /// Flat keys: the column named `field`.
    FlatNamed(&'static str),
    /// Flat keys: the first column holding numbers.
    FlatFirstNumeric,
}

const fn composite(field: &'static str, level: Level) -> PriceFieldRule {
    PriceFieldRule::Composite { field, level }
}

/// Price-field precedence, first match wins.
pub const PRICE_FIELD_RULES: &[PriceFieldRule] = &[
    composite("Adj Close", Level::Outer),
    composite("Adj Close", Level::Inner),
    composite("Close", Level::Outer),
    composite("Close", Level::Inner),
    // Remaining price-like names
    composite("close", Level::Outer),
    composite("close", Level::Inner),
    composite("adjclose", Level::Outer),
    composite("adjclose", Level::Inner),
    composite("Open", Level::Outer),
    composite("Open", Level::Inner),
    PriceFieldRule::FlatNamed("Adj Close"),
    PriceFieldRule::FlatNamed("Close"),
    PriceFieldRule::FlatFirstNumeric,
];

/// A column picked by a rule, with its canonical label.
struct Selected<'a> {
    label: String,
    values: &'a ColumnValues,
}

impl PriceFieldRule {
    fn select<'a>(
        &self,
        table: &'a RawTable,
        scheme: ColumnScheme,
        requested: &[String],
    ) -> Option<Vec<Selected<'a>>> {
        let selected: Vec<Selected<'a>> = match (*self, scheme) {
            (PriceFieldRule::Composite { field, level }, ColumnScheme::Composite) => {
                let field_at = level.index();
                let label_at = 1 - field_at;
                table
                    .columns
                    .iter()
                    .filter_map(|column| match &column.key {
                        ColumnKey::Composite(parts) if parts[field_at] == field => Some(Selected {
                            label: parts[label_at].clone(),
                            values: &column.values,
                        }),
                        _ => None,
                    })
                    .collect()
            }
            (PriceFieldRule::FlatNamed(field), ColumnScheme::Flat) => table
                .columns
                .iter()
                .find(|column| matches!(&column.key, ColumnKey::Flat(name) if name == field))
                .map(|column| Selected {
                    label: requested[0].clone(),
                    values: &column.values,
                })
                .into_iter()
                .collect(),
            (PriceFieldRule::FlatFirstNumeric, ColumnScheme::Flat) => table
                .columns
                .iter()
                .find(|column| column.values.is_numeric())
                .map(|column| Selected {
                    label: requested[0].clone(),
                    values: &column.values,
                })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };

        if selected.is_empty() {
            None
        } else {
            Some(selected)
        }
    }
}

/// Normalize a raw price table into a canonical price matrix.
///
/// # Arguments
///
/// * `raw` - Table returned by the market-data source, `None` if it returned nothing
/// * `requested` - Requested instrument identifiers, in the desired column order
///
/// # Errors
///
/// * `NoData` - the table is absent or has no rows/columns
/// * `Schema` - no price field could be located, or the table is malformed
/// * `EmptyResult` - every row is empty once the price field is selected
pub fn normalize(raw: Option<&RawTable>, requested: &[String]) -> Result<CanonicalPriceMatrix> {
    let table = match raw {
        Some(table) if !table.is_empty() => table,
        _ => {
            return Err(Error::NoData(
                "source returned no data for this range/instruments".to_string(),
            ))
        }
    };
    if requested.is_empty() {
        return Err(Error::Validation(
            "at least one instrument identifier is required".to_string(),
        ));
    }

    table.check_shape()?;
    let scheme = table.scheme()?;

    let (rule, selected) = PRICE_FIELD_RULES
        .iter()
        .find_map(|rule| rule.select(table, scheme, requested).map(|s| (rule, s)))
        .ok_or_else(|| {
            Error::Schema(match scheme {
                ColumnScheme::Composite => {
                    "no usable price columns in two-level column labels".to_string()
                }
                ColumnScheme::Flat => "no usable price columns in flat column labels".to_string(),
            })
        })?;
    tracing::debug!(?rule, columns = selected.len(), "Selected price field");

    // Drop rows with no usable price at all
    let mut dated_rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (i, label) in table.index.iter().enumerate() {
        let row: Vec<Option<f64>> = selected
            .iter()
            .map(|column| usable_price(column.values.number_at(i), label, &column.label))
            .collect();
        if row.iter().all(Option::is_none) {
            continue;
        }

        let date = parse_index_date(label)
            .ok_or_else(|| Error::Schema(format!("row label {:?} is not a date", label)))?;
        dated_rows.push((date, row));
    }

    if dated_rows.is_empty() {
        return Err(Error::EmptyResult(
            "price data is empty after dropping empty rows".to_string(),
        ));
    }

    // Stable sort keeps source order among equal dates; the first one wins
    dated_rows.sort_by_key(|(date, _)| *date);
    let before = dated_rows.len();
    dated_rows.dedup_by_key(|(date, _)| *date);
    if dated_rows.len() < before {
        tracing::warn!(
            dropped = before - dated_rows.len(),
            "Dropped rows with duplicate dates"
        );
    }

    let (order, identifiers): (Vec<usize>, Vec<String>) =
        column_order(&selected, requested).into_iter().unzip();
    let (dates, rows): (Vec<NaiveDate>, Vec<Vec<Option<f64>>>) = dated_rows
        .into_iter()
        .map(|(date, row)| (date, order.iter().map(|&j| row[j]).collect()))
        .unzip();

    CanonicalPriceMatrix::new(dates, identifiers, rows)
}

/// Requested identifiers first (in requested order), then the rest as returned.
///
/// Labels match requested identifiers case-insensitively and take the
/// requested spelling.
fn column_order(selected: &[Selected<'_>], requested: &[String]) -> Vec<(usize, String)> {
    let mut order: Vec<(usize, String)> = Vec::with_capacity(selected.len());
    let mut taken = vec![false; selected.len()];
    for id in requested {
        if let Some(j) =
            (0..selected.len()).find(|&j| !taken[j] && selected[j].label.eq_ignore_ascii_case(id))
        {
            taken[j] = true;
            order.push((j, id.clone()));
        }
    }
    for (j, column) in selected.iter().enumerate() {
        if !taken[j] {
            order.push((j, column.label.clone()));
        }
    }
    order
}

fn usable_price(value: Option<f64>, row: &str, column: &str) -> Option<f64> {
    match value {
        Some(price) if price.is_finite() && price > 0.0 => Some(price),
        Some(price) => {
            tracing::warn!(row, column, price, "Discarding non-positive or non-finite price");
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::raw::RawColumn;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn index(labels: &[&str]) -> Vec<String> {
        ids(labels)
    }

    #[test]
    fn test_absent_table_is_no_data() {
        let result = normalize(None, &ids(&["AAPL"]));
        assert!(matches!(result, Err(Error::NoData(_))));
    }

    #[test]
    fn test_table_without_rows_is_no_data() {
        let table = RawTable::new(Vec::new(), vec![RawColumn::flat("Close", Vec::new())]);
        let result = normalize(Some(&table), &ids(&["AAPL"]));
        assert!(matches!(result, Err(Error::NoData(_))));
    }

    #[test]
    fn test_composite_prefers_adjusted_close_at_outer_level() {
        let table = RawTable::new(
            index(&["2024-01-02", "2024-01-03"]),
            vec![
                RawColumn::composite("Close", "AAPL", vec![Some(1.0), Some(2.0)]),
                RawColumn::composite("Adj Close", "AAPL", vec![Some(10.0), Some(20.0)]),
                RawColumn::composite("Adj Close", "MSFT", vec![Some(30.0), Some(40.0)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["MSFT", "AAPL"])).unwrap();
        assert_eq!(matrix.identifiers(), ids(&["MSFT", "AAPL"]).as_slice());
        assert_eq!(matrix.rows()[0], vec![Some(30.0), Some(10.0)]);
        assert_eq!(matrix.rows()[1], vec![Some(40.0), Some(20.0)]);
    }

    #[test]
    fn test_composite_close_at_inner_level() {
        // (instrument, field) nesting, no adjusted close anywhere
        let table = RawTable::new(
            index(&["2024-01-02", "2024-01-03"]),
            vec![
                RawColumn::composite("AAPL", "Open", vec![Some(1.0), Some(2.0)]),
                RawColumn::composite("AAPL", "Close", vec![Some(3.0), Some(4.0)]),
                RawColumn::composite("MSFT", "Close", vec![Some(5.0), Some(6.0)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL", "MSFT"])).unwrap();
        assert_eq!(matrix.identifiers(), ids(&["AAPL", "MSFT"]).as_slice());
        assert_eq!(matrix.rows()[1], vec![Some(4.0), Some(6.0)]);
    }

    #[test]
    fn test_composite_open_only_uses_fallback_scan() {
        let table = RawTable::new(
            index(&["2024-01-02", "2024-01-03", "2024-01-04"]),
            vec![
                RawColumn::composite("Open", "AAPL", vec![Some(100.0), Some(101.0), Some(102.0)]),
                RawColumn::composite("Volume", "AAPL", vec![Some(5e6), Some(6e6), Some(7e6)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL"])).unwrap();
        assert_eq!(matrix.identifiers(), ids(&["AAPL"]).as_slice());
        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.rows()[2], vec![Some(102.0)]);
    }

    #[test]
    fn test_composite_lowercase_fallback() {
        let table = RawTable::new(
            index(&["2024-01-02"]),
            vec![
                RawColumn::composite("AAPL", "adjclose", vec![Some(7.0)]),
                RawColumn::composite("AAPL", "Open", vec![Some(6.0)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL"])).unwrap();
        assert_eq!(matrix.rows()[0], vec![Some(7.0)]);
    }

    #[test]
    fn test_composite_without_price_field_is_schema_error() {
        let table = RawTable::new(
            index(&["2024-01-02"]),
            vec![RawColumn::composite("Volume", "AAPL", vec![Some(1.0)])],
        );
        let result = normalize(Some(&table), &ids(&["AAPL"]));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_flat_prefers_adjusted_close_and_renames() {
        let table = RawTable::new(
            index(&["2024-01-02", "2024-01-03"]),
            vec![
                RawColumn::flat("Close", vec![Some(1.0), Some(2.0)]),
                RawColumn::flat("Adj Close", vec![Some(0.9), Some(1.8)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL"])).unwrap();
        assert_eq!(matrix.identifiers(), ids(&["AAPL"]).as_slice());
        assert_eq!(matrix.rows()[1], vec![Some(1.8)]);
    }

    #[test]
    fn test_flat_close_round_trip() {
        let prices = [101.0, 102.5, 100.25];
        let table = RawTable::new(
            index(&["2024-01-02", "2024-01-03", "2024-01-04"]),
            vec![RawColumn::flat("Close", prices.iter().copied().map(Some).collect())],
        );

        let normalized = normalize(Some(&table), &ids(&["AAPL"])).unwrap();
        let direct = CanonicalPriceMatrix::from_prices(
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            ],
            ids(&["AAPL"]),
            prices.iter().map(|p| vec![*p]).collect(),
        )
        .unwrap();

        assert_eq!(normalized, direct);
    }

    #[test]
    fn test_flat_first_numeric_column() {
        let table = RawTable::new(
            index(&["2024-01-02"]),
            vec![
                RawColumn {
                    key: ColumnKey::Flat("Symbol".to_string()),
                    values: ColumnValues::Text(vec![Some("AAPL".to_string())]),
                },
                RawColumn::flat("Last", vec![Some(42.0)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL"])).unwrap();
        assert_eq!(matrix.rows()[0], vec![Some(42.0)]);
    }

    #[test]
    fn test_flat_without_numeric_column_is_schema_error() {
        let table = RawTable::new(
            index(&["2024-01-02"]),
            vec![RawColumn {
                key: ColumnKey::Flat("Symbol".to_string()),
                values: ColumnValues::Text(vec![Some("AAPL".to_string())]),
            }],
        );
        let result = normalize(Some(&table), &ids(&["AAPL"]));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_all_missing_rows_dropped_and_empty_result() {
        let table = RawTable::new(
            index(&["2024-01-02", "2024-01-03"]),
            vec![
                RawColumn::composite("Close", "AAPL", vec![None, Some(2.0)]),
                RawColumn::composite("Close", "MSFT", vec![None, None]),
            ],
        );
        let matrix = normalize(Some(&table), &ids(&["AAPL", "MSFT"])).unwrap();
        assert_eq!(matrix.row_count(), 1);
        assert_eq!(matrix.rows()[0], vec![Some(2.0), None]);

        let empty = RawTable::new(
            index(&["2024-01-02"]),
            vec![RawColumn::composite("Close", "AAPL", vec![None])],
        );
        let result = normalize(Some(&empty), &ids(&["AAPL"]));
        assert!(matches!(result, Err(Error::EmptyResult(_))));
    }

    #[test]
    fn test_rows_sorted_and_duplicate_dates_dropped() {
        let table = RawTable::new(
            index(&["2024-01-04", "2024-01-02T00:00:00Z", "2024-01-03", "2024-01-02"]),
            vec![RawColumn::flat(
                "Close",
                vec![Some(4.0), Some(2.0), Some(3.0), Some(99.0)],
            )],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL"])).unwrap();
        let prices: Vec<Option<f64>> = matrix.rows().iter().map(|r| r[0]).collect();
        assert_eq!(prices, vec![Some(2.0), Some(3.0), Some(4.0)]);
        assert!(matrix.dates().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_unparseable_row_label_is_schema_error() {
        let table = RawTable::new(
            index(&["yesterday"]),
            vec![RawColumn::flat("Close", vec![Some(1.0)])],
        );
        let result = normalize(Some(&table), &ids(&["AAPL"]));
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_unrequested_columns_appended_in_source_order() {
        let table = RawTable::new(
            index(&["2024-01-02"]),
            vec![
                RawColumn::composite("Close", "ZZZ", vec![Some(1.0)]),
                RawColumn::composite("Close", "MSFT", vec![Some(2.0)]),
                RawColumn::composite("Close", "YYY", vec![Some(3.0)]),
                RawColumn::composite("Close", "AAPL", vec![Some(4.0)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL", "MSFT", "QQQ"])).unwrap();
        assert_eq!(
            matrix.identifiers(),
            ids(&["AAPL", "MSFT", "ZZZ", "YYY"]).as_slice()
        );
        assert_eq!(matrix.rows()[0], vec![Some(4.0), Some(2.0), Some(1.0), Some(3.0)]);
    }

    #[test]
    fn test_source_labels_match_requested_identifiers_ignoring_case() {
        let table = RawTable::new(
            index(&["2024-01-02"]),
            vec![
                RawColumn::composite("Close", "msft", vec![Some(2.0)]),
                RawColumn::composite("Close", "aapl", vec![Some(4.0)]),
            ],
        );

        let matrix = normalize(Some(&table), &ids(&["AAPL", "MSFT"])).unwrap();
        assert_eq!(matrix.identifiers(), ids(&["AAPL", "MSFT"]).as_slice());
        assert_eq!(matrix.rows()[0], vec![Some(4.0), Some(2.0)]);
    }

    #[test]
    fn test_non_positive_prices_are_missing() {
        let table = RawTable::new(
            index(&["2024-01-02", "2024-01-03"]),
            vec![RawColumn::flat("Close", vec![Some(0.0), Some(5.0)])],
        );
        let matrix = normalize(Some(&table), &ids(&["AAPL"])).unwrap();
        assert_eq!(matrix.row_count(), 1);
        assert_eq!(matrix.rows()[0], vec![Some(5.0)]);
    }

    #[test]
    fn test_mixed_column_labels_are_schema_error() {
        let table = RawTable::new(
            index(&["2024-01-02"]),
            vec![
                RawColumn::flat("Close", vec![Some(1.0)]),
                RawColumn::composite("Close", "AAPL", vec![Some(1.0)]),
            ],
        );
        let result = normalize(Some(&table), &ids(&["AAPL"]));
        assert!(matches!(result, Err(Error::Schema(_))));
    }
}
