//! Shared fixtures: a small December 2011 extract in an in-memory container

use retail_star_etl::BlobStore;
use retail_star_etl::etl::SourcePaths;

pub const TRANSACTIONS_CSV: &str = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
581587,22423,REGENCY CAKESTAND 3 TIER,2,2011-12-09 12:50:00,12.75,7,US
581587,X123,MYSTERY ITEM,1,2011-12-09 12:50:00,3.0,7,UK
581588,22423,REGENCY CAKESTAND 3 TIER,-3,2011-12-09 13:00:00,5.0,101,France
581589,23084,RABBIT NIGHT LIGHT,4,2011-12-10 09:00:00,2.08,,France
581590,23084,RABBIT NIGHT LIGHT,3,2011-12-10 10:30:00,2.0,12680.0,France
";

pub const PRODUCTS_JSON: &str = r#"[
  {"StockCode": 22423, "Category": "Kitchen", "Brand": "Regency", "UnitPrice": 10.95},
  {"StockCode": "23084", "Category": "Lighting", "Brand": "Luna"}
]"#;

pub const CUSTOMERS_JSON: &str = r#"[
  {"CustomerID": 7, "Segment": "Retail"},
  {"CustomerID": 12680, "Segment": "Wholesale"}
]"#;

/// A container holding the three source files at their default paths
pub async fn seeded_store() -> BlobStore {
    let store = BlobStore::in_memory("raw");
    let paths = SourcePaths::default();
    store.put(&paths.transactions, TRANSACTIONS_CSV).await.unwrap();
    store.put(&paths.products, PRODUCTS_JSON).await.unwrap();
    store.put(&paths.customers, CUSTOMERS_JSON).await.unwrap();
    store
}
