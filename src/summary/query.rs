// src/summary/query.rs

pub const VENDOR_INVOICE_TABLE: &str = "vendor_invoice";
pub const PURCHASES_TABLE: &str = "purchases";
pub const PURCHASE_PRICES_TABLE: &str = "purchase_prices";
pub const SALES_TABLE: &str = "sales";
pub const SUMMARY_TABLE: &str = "vendor_sales_summary";

/// One row per (vendor, brand, ...) purchase group with priced purchases,
/// left-joined with sales and freight totals. Unmatched sales/freight
/// columns are NULL here and zero-filled by the cleaning pass.
pub const VENDOR_SUMMARY_QUERY: &str = r#"
WITH FreightSummary AS (
    SELECT VendorNumber, SUM(Freight) AS FreightCost
    FROM vendor_invoice
    GROUP BY VendorNumber
),
PurchaseSummary AS (
    SELECT
        p.VendorNumber,
        p.VendorName,
        p.Brand,
        p.Description,
        p.PurchasePrice,
        pp.Price AS ActualPrice,
        pp.Volume,
        SUM(p.Quantity) AS TotalPurchaseQuantity,
        SUM(p.Dollars) AS TotalPurchaseDollars
    FROM purchases p
    JOIN purchase_prices pp ON p.Brand = pp.Brand
    WHERE p.PurchasePrice > 0
    GROUP BY p.VendorNumber, p.VendorName, p.Brand, p.Description,
             p.PurchasePrice, pp.Price, pp.Volume
),
SalesSummary AS (
    SELECT
        VendorNo,
        Brand,
        SUM(SalesQuantity) AS TotalSalesQuantity,
        SUM(SalesDollars) AS TotalSalesDollars,
        SUM(SalesPrice) AS TotalSalesPrice,
        SUM(ExciseTax) AS TotalExciseTax
    FROM sales
    GROUP BY VendorNo, Brand
)
SELECT
    ps.VendorNumber,
    ps.VendorName,
    ps.Brand,
    ps.Description,
    ps.PurchasePrice,
    ps.ActualPrice,
    ps.Volume,
    ps.TotalPurchaseQuantity,
    ps.TotalPurchaseDollars,
    ss.TotalSalesQuantity,
    ss.TotalSalesDollars,
    ss.TotalSalesPrice,
    ss.TotalExciseTax,
    fs.FreightCost
FROM PurchaseSummary ps
LEFT JOIN SalesSummary ss
    ON ps.VendorNumber = ss.VendorNo AND ps.Brand = ss.Brand
LEFT JOIN FreightSummary fs
    ON ps.VendorNumber = fs.VendorNumber
ORDER BY ps.TotalPurchaseDollars DESC
"#;

/// Source tables the query reads.
pub const SOURCE_TABLES: [&str; 4] = [
    VENDOR_INVOICE_TABLE,
    PURCHASES_TABLE,
    PURCHASE_PRICES_TABLE,
    SALES_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_reads_every_source_table() {
        for t in SOURCE_TABLES {
            assert!(
                VENDOR_SUMMARY_QUERY.split_whitespace().any(|w| w == t),
                "query does not read {t}"
            );
        }
    }
}
