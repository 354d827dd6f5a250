use crate::matcher::Matchers;
use crate::Dated;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not read marketing data at '{}'", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not read marketing archive")]
    Zip(#[from] zip::result::ZipError),
    #[error("Could not read '{file}' from the marketing archive")]
    ArchiveEntry {
        file: String,
        source: std::io::Error,
    },
    #[error("Marketing file '{file}' is not valid CSV")]
    Csv { file: String, source: csv::Error },
    #[error("Marketing file '{file}' lacks a {kind} column, tried {tried}")]
    MissingColumn {
        file: String,
        kind: &'static str,
        tried: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Promotion,
    SponsoredListing,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Promotion, Category::SponsoredListing];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Promotion => "Promotion",
            Category::SponsoredListing => "Sponsored Listing",
        }
    }
}

/// Who paid for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum Attribution {
    Corporate,
    /// Self-serve campaigns run by the franchise group.
    Todc,
}

impl Attribution {
    pub const ALL: [Attribution; 2] = [Attribution::Corporate, Attribution::Todc];

    pub fn name(&self) -> &'static str {
        match self {
            Attribution::Corporate => "Corporate",
            Attribution::Todc => "TODC",
        }
    }
}

/// A file as found in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub name: String,
    pub data: Vec<u8>,
}

/// The folders of a marketing bundle, by name, and the files directly within them.
///
/// Nothing is interpreted yet, see [`parse_bundle()`][function::parse_bundle()].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    pub folders: BTreeMap<String, Vec<BundleFile>>,
}

impl Bundle {
    /// Read all sub-directories of `root` and the files within them.
    pub fn from_directory(root: &Path) -> Result<Self, Error> {
        let io_err = |path: &Path| {
            let path = path.to_owned();
            move |source| Error::Io { path, source }
        };
        let mut bundle = Bundle::default();
        for entry in std::fs::read_dir(root).map_err(io_err(root))? {
            let entry = entry.map_err(io_err(root))?;
            let folder = entry.path();
            if !folder.is_dir() {
                continue;
            }
            let files = bundle
                .folders
                .entry(entry.file_name().to_string_lossy().into_owned())
                .or_default();
            for file in std::fs::read_dir(&folder).map_err(io_err(&folder))? {
                let path = file.map_err(io_err(&folder))?.path();
                if !path.is_file() {
                    continue;
                }
                files.push(BundleFile {
                    name: path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    data: std::fs::read(&path).map_err(io_err(&path))?,
                });
            }
            files.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(bundle)
    }

    /// Read a zip archive, placing each file into the folder it is directly contained in.
    pub fn from_archive(archive: impl std::io::Read + std::io::Seek) -> Result<Self, Error> {
        use std::io::Read;

        let mut archive = zip::ZipArchive::new(archive)?;
        let mut bundle = Bundle::default();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let path = entry.name().replace('\\', "/");
            let mut components: Vec<_> = path.split('/').filter(|c| !c.is_empty()).collect();
            if entry.is_dir() {
                if let Some(folder) = components.last() {
                    bundle.folders.entry(folder.to_string()).or_default();
                }
                continue;
            }
            let (Some(name), Some(folder)) = (components.pop(), components.pop()) else {
                continue;
            };
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|source| Error::ArchiveEntry {
                    file: path.clone(),
                    source,
                })?;
            bundle
                .folders
                .entry(folder.to_string())
                .or_default()
                .push(BundleFile {
                    name: name.to_string(),
                    data,
                });
        }
        for files in bundle.folders.values_mut() {
            files.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(bundle)
    }
}

/// One row of a marketing file.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketingRow {
    /// The canonical store id taken from the folder name.
    pub store: String,
    /// The canonical store id from within the file, if it has such a column.
    pub store_id: Option<String>,
    pub category: Category,
    pub attribution: Attribution,
    pub date: Option<time::Date>,
    pub orders: f64,
    pub sales: f64,
    pub spend: f64,
    pub new_customers: Option<f64>,
}

/// Everything read from a bundle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Marketing {
    /// All stores with a folder in the bundle, whether or not it contained data.
    pub stores: BTreeSet<String>,
    pub rows: Vec<MarketingRow>,
}

/// Campaign results of one store, category and attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketingRecord {
    pub store: String,
    pub category: Category,
    pub attribution: Attribution,
    pub orders: f64,
    pub sales: f64,
    pub spend: f64,
}

/// New customers acquired by DoorDash promotions of a store on a day.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomers {
    pub store: String,
    pub date: time::Date,
    pub count: f64,
}

impl Dated for NewCustomers {
    fn date(&self) -> time::Date {
        self.date
    }
}

/// The naming rules and columns of marketing bundles.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Options {
    pub matchers: Matchers,
    pub promotion_spend_columns: Vec<String>,
    pub sponsored_spend_columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub self_serve_columns: Vec<String>,
    pub orders_columns: Vec<String>,
    pub sales_columns: Vec<String>,
    pub new_customers_columns: Vec<String>,
    pub store_columns: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        let names = |names: &[&str]| names.iter().map(|name| name.to_string()).collect();
        Options {
            matchers: Matchers::default(),
            promotion_spend_columns: names(&[
                "Customer discounts from marketing | (Funded by you)",
                "Spend",
            ]),
            sponsored_spend_columns: names(&[
                "Marketing fees | (including any applicable taxes)",
                "Spend",
            ]),
            date_columns: names(&["Date"]),
            self_serve_columns: names(&["Is self serve campaign"]),
            orders_columns: names(&["Orders"]),
            sales_columns: names(&["Sales"]),
            new_customers_columns: names(&["New customers acquired"]),
            store_columns: names(&["Store ID", "Shop ID"]),
        }
    }
}

impl Options {
    fn spend_columns(&self, category: Category) -> &[String] {
        match category {
            Category::Promotion => &self.promotion_spend_columns,
            Category::SponsoredListing => &self.sponsored_spend_columns,
        }
    }
}

fn is_self_serve(value: &str) -> bool {
    ["true", "yes", "y", "1"]
        .iter()
        .any(|truthy| value.trim().eq_ignore_ascii_case(truthy))
}

pub(crate) mod function {
    use crate::load::function::header_idx;
    use crate::marketing::{
        is_self_serve, Attribution, Bundle, Category, Error, Marketing, MarketingRecord, MarketingRow,
        NewCustomers, Options,
    };
    use crate::table::{Column, Figure, Row, SummaryTable, Unit};
    use crate::window::{DateWindow, ExcludedDates};
    use crate::{dates, normalize_store_id, parse_amount};
    use log::{debug, warn};
    use std::collections::BTreeMap;

    /// Read all files of `bundle` that match the naming rules in `options`.
    pub fn parse_bundle(bundle: &Bundle, options: &Options) -> Result<Marketing, Error> {
        let mut marketing = Marketing::default();
        for (folder, files) in &bundle.folders {
            let Some(store) = options.matchers.store(folder) else {
                debug!("ignoring folder '{folder}' in marketing bundle");
                continue;
            };
            let store = normalize_store_id(store);
            marketing.stores.insert(store.clone());
            for file in files {
                let Some(category) = options.matchers.category(&file.name) else {
                    debug!("ignoring file '{folder}/{}' in marketing bundle", file.name);
                    continue;
                };
                let rows = parse_file(&format!("{folder}/{}", file.name), &file.data, &store, category, options)?;
                debug!(
                    "read {} {} row(s) from '{folder}/{}'",
                    rows.len(),
                    category.name(),
                    file.name
                );
                marketing.rows.extend(rows);
            }
        }
        Ok(marketing)
    }

    fn parse_file(
        file: &str,
        data: &[u8],
        store: &str,
        category: Category,
        options: &Options,
    ) -> Result<Vec<MarketingRow>, Error> {
        let csv_err = |source| Error::Csv {
            file: file.into(),
            source,
        };
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);
        let headers: Vec<String> = csv
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();
        let spend_columns = options.spend_columns(category);
        let spend = header_idx(spend_columns, &headers).ok_or_else(|| Error::MissingColumn {
            file: file.into(),
            kind: "spend",
            tried: spend_columns.join(", "),
        })?;
        let date_column = header_idx(&options.date_columns, &headers);
        let self_serve = header_idx(&options.self_serve_columns, &headers);
        let orders = header_idx(&options.orders_columns, &headers);
        let sales = header_idx(&options.sales_columns, &headers);
        let new_customers = header_idx(&options.new_customers_columns, &headers);
        let store_id = header_idx(&options.store_columns, &headers);

        let mut rows = Vec::new();
        for record in csv.records() {
            let record = match record {
                Ok(record) => record,
                Err(err) if !err.is_io_error() => {
                    warn!("{file}: skipping unreadable row: {err}");
                    continue;
                }
                Err(err) => return Err(csv_err(err)),
            };
            let field = |index: Option<usize>| index.and_then(|index| record.get(index)).map(str::trim);
            let amount = |index| field(index).and_then(parse_amount).unwrap_or_default();
            let date = match field(date_column) {
                Some(value) => match dates::parse_date(value) {
                    Some(date) => Some(date),
                    None => {
                        debug!("{file}: skipping row with unparseable date '{value}'");
                        continue;
                    }
                },
                None => None,
            };
            rows.push(MarketingRow {
                store: store.into(),
                store_id: field(store_id)
                    .filter(|id| !id.is_empty())
                    .map(normalize_store_id),
                category,
                attribution: if field(self_serve).map_or(false, is_self_serve) {
                    Attribution::Todc
                } else {
                    Attribution::Corporate
                },
                date,
                orders: amount(orders),
                sales: amount(sales),
                spend: amount(Some(spend)),
                new_customers: field(new_customers).and_then(parse_amount),
            });
        }
        Ok(rows)
    }

    /// Return the rows that fall into `window` without being `excluded`. Rows of files without date column are kept.
    pub fn within(marketing: &Marketing, window: &DateWindow, excluded: &ExcludedDates) -> Marketing {
        Marketing {
            stores: marketing.stores.clone(),
            rows: marketing
                .rows
                .iter()
                .filter(|row| {
                    row.date
                        .map_or(true, |date| window.contains(date) && !excluded.contains(date))
                })
                .cloned()
                .collect(),
        }
    }

    /// Sum rows per store, category and attribution.
    ///
    /// Every store of `marketing` gets a record for every category and attribution, with zeros where there is no data.
    pub fn records(marketing: &Marketing) -> Vec<MarketingRecord> {
        let mut sums = BTreeMap::new();
        for store in &marketing.stores {
            for category in Category::ALL {
                for attribution in Attribution::ALL {
                    sums.insert((store.clone(), category, attribution), [0.0; 3]);
                }
            }
        }
        for row in &marketing.rows {
            let sum = sums
                .entry((row.store.clone(), row.category, row.attribution))
                .or_insert([0.0; 3]);
            sum[0] += row.orders;
            sum[1] += row.sales;
            sum[2] += row.spend;
        }
        sums.into_iter()
            .map(
                |((store, category, attribution), [orders, sales, spend])| MarketingRecord {
                    store,
                    category,
                    attribution,
                    orders,
                    sales,
                    spend,
                },
            )
            .collect()
    }

    /// Sum `marketing` into complete records, using only rows within `window` if one is given.
    pub fn aggregate(marketing: &Marketing, window: Option<(&DateWindow, &ExcludedDates)>) -> Vec<MarketingRecord> {
        match window {
            Some((window, excluded)) => records(&within(marketing, window, excluded)),
            None => records(marketing),
        }
    }

    /// New customers of promotion rows that have a date, attributed to the store id within the file if present.
    pub fn new_customers(marketing: &Marketing) -> Vec<NewCustomers> {
        marketing
            .rows
            .iter()
            .filter(|row| row.category == Category::Promotion)
            .filter_map(|row| {
                Some(NewCustomers {
                    store: row.store_id.clone().unwrap_or_else(|| row.store.clone()),
                    date: row.date?,
                    count: row.new_customers?,
                })
            })
            .collect()
    }

    fn amount_column(name: &str, unit: Unit) -> Column {
        Column {
            name: name.into(),
            figure: Figure::Amount,
            unit: Some(unit),
        }
    }

    /// Pivot spend by store into Corporate and TODC promotion and sponsored listing spend, with totals.
    pub fn create_corporate_vs_todc_table(records: &[MarketingRecord]) -> SummaryTable {
        let pivot = [
            (Attribution::Corporate, Category::Promotion),
            (Attribution::Corporate, Category::SponsoredListing),
            (Attribution::Todc, Category::Promotion),
            (Attribution::Todc, Category::SponsoredListing),
        ];
        let mut columns: Vec<_> = pivot
            .iter()
            .map(|(attribution, category)| {
                let category = match category {
                    Category::Promotion => "Promotion",
                    Category::SponsoredListing => "Sponsored",
                };
                amount_column(&format!("{} {category}", attribution.name()), Unit::Currency)
            })
            .collect();
        columns.push(amount_column("Total", Unit::Currency));

        let mut by_store = BTreeMap::<&str, [f64; 4]>::new();
        for record in records {
            let cells = by_store.entry(record.store.as_str()).or_default();
            if let Some(index) = pivot
                .iter()
                .position(|key| *key == (record.attribution, record.category))
            {
                cells[index] += record.spend;
            }
        }
        let mut totals = [0.0; 4];
        let mut rows: Vec<_> = by_store
            .into_iter()
            .map(|(store, cells)| {
                for (total, cell) in totals.iter_mut().zip(cells) {
                    *total += cell;
                }
                spend_row(store, cells)
            })
            .collect();
        rows.push(spend_row("Total", totals));

        SummaryTable {
            name: "Corporate vs TODC by Store".into(),
            label: "Store ID".into(),
            columns,
            rows,
        }
    }

    fn spend_row(label: &str, cells: [f64; 4]) -> Row {
        Row {
            label: label.into(),
            unit: Some(Unit::Currency),
            cells: cells
                .iter()
                .copied()
                .chain(Some(cells.iter().sum()))
                .map(Some)
                .collect(),
        }
    }

    /// Orders, sales, spend and their ratios per attribution, for `category` or for all categories.
    pub fn attribution_summary(records: &[MarketingRecord], category: Option<Category>) -> SummaryTable {
        let columns = vec![
            amount_column("Orders", Unit::Count),
            amount_column("Sales", Unit::Currency),
            amount_column("Spend", Unit::Currency),
            amount_column("ROAS", Unit::Ratio),
            amount_column("Cost per Order", Unit::Currency),
        ];
        let rows = Attribution::ALL
            .iter()
            .map(|attribution| {
                let (mut orders, mut sales, mut spend) = (0.0, 0.0, 0.0);
                for record in records.iter().filter(|record| {
                    record.attribution == *attribution && category.map_or(true, |c| c == record.category)
                }) {
                    orders += record.orders;
                    sales += record.sales;
                    spend += record.spend;
                }
                Row {
                    label: attribution.name().into(),
                    unit: None,
                    cells: vec![
                        Some(orders),
                        Some(sales),
                        Some(spend),
                        (spend != 0.0).then(|| sales / spend),
                        (orders != 0.0).then(|| spend / orders),
                    ],
                }
            })
            .collect();
        SummaryTable {
            name: format!(
                "Corporate vs TODC: {}",
                category.map_or("Combined", |c| c.name())
            ),
            label: "Campaign".into(),
            columns,
            rows,
        }
    }

    /// All marketing tables: the store pivot, then the attribution summaries of promotions, sponsored listings and both.
    pub fn tables(records: &[MarketingRecord]) -> Vec<SummaryTable> {
        vec![
            create_corporate_vs_todc_table(records),
            attribution_summary(records, Some(Category::Promotion)),
            attribution_summary(records, Some(Category::SponsoredListing)),
            attribution_summary(records, None),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::function::*;
    use super::*;
    use crate::window::{DateWindow, ExcludedDates};
    use time::macros::date;

    fn file(name: &str, data: &str) -> BundleFile {
        BundleFile {
            name: name.into(),
            data: data.as_bytes().to_vec(),
        }
    }

    fn bundle() -> Bundle {
        let mut bundle = Bundle::default();
        bundle.folders.insert(
            "marketing_001".into(),
            vec![
                file(
                    "MARKETING_PROMOTION_a.csv",
                    "Date,Store ID,Is self serve campaign,Orders,Sales,Customer discounts from marketing | (Funded by you),New customers acquired\n\
                     2024-12-02,900,TRUE,4,80,20,3\n\
                     2024-12-03,900,FALSE,2,50,\"$10.00\",1\n\
                     2024-11-03,900,TRUE,9,90,90,9\n",
                ),
                file(
                    "MARKETING_SPONSORED_LISTING_a.csv",
                    "Date,Is self serve campaign,Orders,Sales,Marketing fees | (including any applicable taxes)\n\
                     2024-12-04,True,1,30,5\n",
                ),
                file("notes.txt", "ignored"),
            ],
        );
        bundle.folders.insert("marketing_2".into(), vec![file("README", "")]);
        bundle
            .folders
            .insert("photos".into(), vec![file("MARKETING_PROMOTION.csv", "garbage")]);
        bundle
    }

    fn december() -> DateWindow {
        DateWindow::parse("12/01/2024-12/31/2024").unwrap()
    }

    #[test]
    fn bundles_are_parsed_by_naming_rules() {
        let marketing = parse_bundle(&bundle(), &Options::default()).unwrap();
        assert_eq!(
            marketing.stores.iter().map(String::as_str).collect::<Vec<_>>(),
            ["1", "2"]
        );
        assert_eq!(marketing.rows.len(), 4);
        let first = &marketing.rows[0];
        assert_eq!(first.store, "1");
        assert_eq!(first.store_id.as_deref(), Some("900"));
        assert_eq!(first.attribution, Attribution::Todc);
        assert_eq!(first.date, Some(date!(2024 - 12 - 02)));
        assert_eq!((first.orders, first.sales, first.spend), (4.0, 80.0, 20.0));
        assert_eq!(marketing.rows[1].attribution, Attribution::Corporate);
        assert_eq!(marketing.rows[1].spend, 10.0);
        assert_eq!(marketing.rows[3].category, Category::SponsoredListing);
    }

    #[test]
    fn records_are_complete_and_windowed() {
        let marketing = parse_bundle(&bundle(), &Options::default()).unwrap();
        let december = within(&marketing, &december(), &ExcludedDates::default());
        let records = records(&december);
        assert_eq!(records.len(), 8, "two stores, two categories, two attributions");
        let todc_promotion = records
            .iter()
            .find(|r| {
                r.store == "1" && r.category == Category::Promotion && r.attribution == Attribution::Todc
            })
            .unwrap();
        assert_eq!(todc_promotion.spend, 20.0, "the November row is outside the window");
        assert!(records
            .iter()
            .filter(|r| r.store == "2")
            .all(|r| r.spend == 0.0 && r.orders == 0.0));
    }

    #[test]
    fn corporate_vs_todc_pivot() {
        let marketing = parse_bundle(&bundle(), &Options::default()).unwrap();
        let records = records(&within(&marketing, &december(), &ExcludedDates::default()));
        let table = create_corporate_vs_todc_table(&records);
        let columns: Vec<_> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            columns,
            [
                "Corporate Promotion",
                "Corporate Sponsored",
                "TODC Promotion",
                "TODC Sponsored",
                "Total"
            ]
        );
        let labels: Vec<_> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["1", "2", "Total"]);
        assert_eq!(table.cell("1", "Corporate Promotion"), Some(10.0));
        assert_eq!(table.cell("1", "TODC Promotion"), Some(20.0));
        assert_eq!(table.cell("1", "TODC Sponsored"), Some(5.0));
        assert_eq!(table.cell("1", "Total"), Some(35.0));
        assert_eq!(table.cell("2", "Total"), Some(0.0));
        assert_eq!(table.cell("Total", "TODC Promotion"), Some(20.0));
        assert_eq!(table.cell("Total", "Total"), Some(35.0));
    }

    #[test]
    fn attribution_summaries() {
        let marketing = parse_bundle(&bundle(), &Options::default()).unwrap();
        let records = records(&within(&marketing, &december(), &ExcludedDates::default()));
        let tables = tables(&records);
        assert_eq!(tables.len(), 4);
        let combined = &tables[3];
        assert_eq!(combined.name, "Corporate vs TODC: Combined");
        assert_eq!(combined.cell("TODC", "Orders"), Some(5.0));
        assert_eq!(combined.cell("TODC", "Spend"), Some(25.0));
        assert_eq!(combined.cell("TODC", "ROAS"), Some(110.0 / 25.0));
        assert_eq!(combined.cell("TODC", "Cost per Order"), Some(5.0));
        let sponsored = &tables[2];
        assert_eq!(sponsored.cell("Corporate", "ROAS"), None, "nothing was spent");
    }

    #[test]
    fn new_customers_use_the_store_id_of_the_file() {
        let marketing = parse_bundle(&bundle(), &Options::default()).unwrap();
        let customers = new_customers(&marketing);
        assert_eq!(customers.len(), 3);
        assert!(customers.iter().all(|c| c.store == "900"));
        assert_eq!(customers.iter().map(|c| c.count).sum::<f64>(), 13.0);
    }

    #[test]
    fn files_without_dates_are_kept_whole_by_windows() {
        let mut bundle = Bundle::default();
        bundle.folders.insert(
            "marketing_5".into(),
            vec![
                file("MARKETING_PROMOTION_all.csv", "Spend\n100\n"),
                file(
                    "MARKETING_SPONSORED_LISTING_dated.csv",
                    "Date,Spend\n2024-11-20,7\n2024-12-20,9\n,11\n",
                ),
            ],
        );
        let marketing = parse_bundle(&bundle, &Options::default()).unwrap();
        assert_eq!(marketing.rows.len(), 3, "the row with an empty date is skipped");
        let records = aggregate(&marketing, Some((&december(), &ExcludedDates::default())));
        let spend = |category| {
            records
                .iter()
                .filter(|r| r.category == category && r.attribution == Attribution::Corporate)
                .map(|r| r.spend)
                .sum::<f64>()
        };
        assert_eq!(spend(Category::Promotion), 100.0);
        assert_eq!(spend(Category::SponsoredListing), 9.0);
    }

    #[test]
    fn rows_with_invalid_utf8_are_skipped() {
        let mut data = b"Date,Spend,Campaign\n2024-12-01,5,a\n2024-12-02,6,".to_vec();
        data.extend_from_slice(b"\xff\n2024-12-03,7,c\n");
        let mut bundle = Bundle::default();
        bundle.folders.insert(
            "marketing_5".into(),
            vec![BundleFile {
                name: "MARKETING_PROMOTION.csv".into(),
                data,
            }],
        );
        let marketing = parse_bundle(&bundle, &Options::default()).unwrap();
        let spend: Vec<_> = marketing.rows.iter().map(|row| row.spend).collect();
        assert_eq!(spend, [5.0, 7.0]);
    }

    #[test]
    fn files_without_spend_column_are_errors() {
        let mut bundle = Bundle::default();
        bundle.folders.insert(
            "marketing_3".into(),
            vec![file("MARKETING_PROMOTION.csv", "Date,Orders\n2024-12-01,1\n")],
        );
        match parse_bundle(&bundle, &Options::default()) {
            Err(Error::MissingColumn { file, kind, .. }) => {
                assert_eq!(file, "marketing_3/MARKETING_PROMOTION.csv");
                assert_eq!(kind, "spend");
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn archives_are_read_by_folder() {
        use std::io::Write;
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            zip.add_directory("export/marketing_7/", options).unwrap();
            zip.add_directory("export/marketing_8/", options).unwrap();
            zip.start_file("export/marketing_7/MARKETING_PROMOTION_x.csv", options)
                .unwrap();
            zip.write_all(b"Spend\n12\n").unwrap();
            zip.start_file("top-level.csv", options).unwrap();
            zip.write_all(b"a\n").unwrap();
            zip.finish().unwrap();
        }
        let bundle = Bundle::from_archive(std::io::Cursor::new(buf)).unwrap();
        assert_eq!(
            bundle.folders.keys().map(String::as_str).collect::<Vec<_>>(),
            ["marketing_7", "marketing_8"]
        );
        let marketing = parse_bundle(&bundle, &Options::default()).unwrap();
        assert_eq!(marketing.stores.len(), 2);
        assert_eq!(marketing.rows.len(), 1);
        assert_eq!(marketing.rows[0].date, None);
        assert_eq!(marketing.rows[0].spend, 12.0);
    }
}
