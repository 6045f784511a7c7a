use std::io::Write;

use tempfile::NamedTempFile;
use weigh_config::load_products_csv;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("tempfile");
    f.write_all(contents.as_bytes()).expect("write csv");
    f.flush().expect("flush");
    f
}

#[test]
fn loads_well_formed_catalog() {
    let f = write_csv(
        "product_id,customer,variety,density,low_kg,target_kg,high_kg\n\
         P-64-001,ACME,ACPE,64,59.74,65.0,85.0\n\
         P-96-002,Beta,BL,96,87.55,100.0,115.0\n",
    );
    let rows = load_products_csv(f.path()).expect("load");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].product_id, "P-64-001");
    assert_eq!(rows[0].density, 64);
    assert!((rows[1].target_kg - 100.0).abs() < f64::EPSILON);
}

#[test]
fn rejects_wrong_headers() {
    let f = write_csv("id,cust,low,high\nP,ACME,1,2\n");
    let err = load_products_csv(f.path()).expect_err("must reject");
    assert!(err.to_string().contains("headers"));
}

#[test]
fn rejects_unordered_band() {
    let f = write_csv(
        "product_id,customer,variety,density,low_kg,target_kg,high_kg\n\
         P-64-001,ACME,ACPE,64,85.0,65.0,59.74\n",
    );
    let err = load_products_csv(f.path()).expect_err("must reject");
    assert!(err.to_string().contains("low < target < high"));
}

#[test]
fn rejects_non_numeric_weight() {
    let f = write_csv(
        "product_id,customer,variety,density,low_kg,target_kg,high_kg\n\
         P-64-001,ACME,ACPE,64,abc,65.0,85.0\n",
    );
    let err = load_products_csv(f.path()).expect_err("must reject");
    assert!(err.to_string().contains("row 2"));
}

#[test]
fn rejects_empty_product_id() {
    let f = write_csv(
        "product_id,customer,variety,density,low_kg,target_kg,high_kg\n\
         ,ACME,ACPE,64,59.74,65.0,85.0\n",
    );
    assert!(load_products_csv(f.path()).is_err());
}
