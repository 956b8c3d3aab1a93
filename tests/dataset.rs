use std::{fs, io::Write, time::SystemTime};

use encoding_rs::UTF_8;
use infact::dataset::{Dataset, DatasetCache, LoadError, MISSING_SENTINEL};
use tempfile::tempdir;

fn fixture_path() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("food_products.csv")
}

fn write_csv(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = fs::File::create(&path).expect("create csv");
    file.write_all(contents.as_bytes()).expect("write csv");
    path
}

#[test]
fn load_normalizes_headers_and_fills_missing_values() {
    let path = fixture_path();
    assert!(path.exists(), "fixture missing: {path:?}");
    let dataset = Dataset::load(&path, None, UTF_8).expect("load fixture");
    assert_eq!(dataset.len(), 10);

    let bread = &dataset.products()[2];
    assert_eq!(bread.product_name, "Golden Wheat Bread");
    assert_eq!(bread.brand, "BakeHouse");
    assert_eq!(bread.healthy_alternatives, MISSING_SENTINEL);

    let yogurt = &dataset.products()[3];
    assert_eq!(yogurt.nutritional_impact, MISSING_SENTINEL);
    assert_eq!(yogurt.healthy_alternatives, "Plain greek yogurt");
}

#[test]
fn load_coerces_bad_numeric_values_to_zero() {
    let dataset = Dataset::load(&fixture_path(), None, UTF_8).expect("load fixture");
    let puffs = &dataset.products()[9];
    assert_eq!(puffs.product_name, "Spicy Corn Puffs");
    assert_eq!(puffs.harmful_ingredient_count, 0);
    assert_eq!(puffs.total_ingredients, 8);
}

#[test]
fn load_keeps_literal_harm_flag_values() {
    let dataset = Dataset::load(&fixture_path(), None, UTF_8).expect("load fixture");
    let drink = &dataset.products()[1];
    assert_eq!(drink.is_harmful, "no");
    assert!(drink.is_flagged_safe());
    assert!(dataset.products()[0].is_flagged_harmful());
}

#[test]
fn load_synthesizes_harm_flag_when_column_is_absent() {
    let dir = tempdir().expect("temp dir");
    let path = write_csv(
        &dir,
        "no_flag.csv",
        "Product Name,Brand,Category,Harmful_Ingredient_Count,Total_Ingredients\n\
         Choco Bar,A,Snack,1,4\n\
         Oat Bar,B,Snack,0,6\n",
    );
    let dataset = Dataset::load(&path, None, UTF_8).expect("load csv");
    assert!(dataset.products().iter().all(|p| p.is_harmful == "No"));
}

#[test]
fn load_keeps_empty_harm_cells_as_missing_values() {
    let dir = tempdir().expect("temp dir");
    let path = write_csv(
        &dir,
        "empty_flag.csv",
        "Product Name,Brand,Category,Is_Harmful?\n\
         Choco Bar,A,Snack,\n\
         Oat Bar,B,Snack,Yes\n",
    );
    let dataset = Dataset::load(&path, None, UTF_8).expect("load csv");
    let unflagged = &dataset.products()[0];
    // Only a wholly absent column synthesizes "No"; an empty cell is a
    // missing value and the product counts as neither harmful nor safe.
    assert_eq!(unflagged.is_harmful, MISSING_SENTINEL);
    assert!(!unflagged.is_flagged_harmful());
    assert!(!unflagged.is_flagged_safe());
    assert_eq!(dataset.products()[1].is_harmful, "Yes");
}

#[test]
fn load_defaults_counts_to_zero_when_columns_are_absent() {
    let dir = tempdir().expect("temp dir");
    let path = write_csv(
        &dir,
        "no_counts.csv",
        "Product Name,Brand,Category\nChoco Bar,A,Snack\n",
    );
    let dataset = Dataset::load(&path, None, UTF_8).expect("load csv");
    let product = &dataset.products()[0];
    assert_eq!(product.harmful_ingredient_count, 0);
    assert_eq!(product.total_ingredients, 0);
    assert_eq!(product.nutritional_impact, MISSING_SENTINEL);
}

#[test]
fn load_truncates_float_counts() {
    let dir = tempdir().expect("temp dir");
    let path = write_csv(
        &dir,
        "floats.csv",
        "Product Name,Brand,Category,Harmful_Ingredient_Count,Total_Ingredients\n\
         Choco Bar,A,Snack,2.0,7.9\n",
    );
    let dataset = Dataset::load(&path, None, UTF_8).expect("load csv");
    assert_eq!(dataset.products()[0].harmful_ingredient_count, 2);
    assert_eq!(dataset.products()[0].total_ingredients, 7);
}

#[test]
fn load_fails_on_missing_file() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("absent.csv");
    let err = Dataset::load(&path, None, UTF_8).expect_err("missing file");
    assert!(matches!(err, LoadError::Open { .. }));
}

#[test]
fn load_fails_on_missing_required_column() {
    let dir = tempdir().expect("temp dir");
    let path = write_csv(&dir, "no_brand.csv", "Product Name,Category\nChoco Bar,Snack\n");
    let err = Dataset::load(&path, None, UTF_8).expect_err("missing column");
    match err {
        LoadError::MissingColumn { column, .. } => assert_eq!(column, "brand"),
        other => panic!("Expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn load_respects_tsv_extension_for_delimiter() {
    let dir = tempdir().expect("temp dir");
    let path = write_csv(
        &dir,
        "products.tsv",
        "Product Name\tBrand\tCategory\nChoco Bar\tA\tSnack\n",
    );
    let dataset = Dataset::load(&path, None, UTF_8).expect("load tsv");
    assert_eq!(dataset.products()[0].category, "Snack");
}

#[test]
fn categories_are_sorted_and_unique() {
    let dataset = Dataset::load(&fixture_path(), None, UTF_8).expect("load fixture");
    assert_eq!(
        dataset.categories(),
        vec!["Bakery", "Beverages", "Dairy", "Snacks"]
    );
}

#[test]
fn cache_reuses_dataset_until_the_file_changes() {
    let dir = tempdir().expect("temp dir");
    let path = write_csv(
        &dir,
        "cached.csv",
        "Product Name,Brand,Category\nChoco Bar,A,Snack\n",
    );
    let stamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000);
    fs::File::options()
        .write(true)
        .open(&path)
        .expect("open for mtime")
        .set_modified(stamp)
        .expect("set mtime");

    let mut cache = DatasetCache::new();
    let first = cache.load(&path, None, UTF_8).expect("first load");
    let second = cache.load(&path, None, UTF_8).expect("second load");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(first.len(), 1);

    fs::write(
        &path,
        "Product Name,Brand,Category\nChoco Bar,A,Snack\nOat Bar,B,Snack\n",
    )
    .expect("rewrite csv");
    let new_stamp = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(2_000);
    fs::File::options()
        .write(true)
        .open(&path)
        .expect("open for mtime")
        .set_modified(new_stamp)
        .expect("set mtime");

    let third = cache.load(&path, None, UTF_8).expect("third load");
    assert!(!std::sync::Arc::ptr_eq(&first, &third));
    assert_eq!(third.len(), 2);
}
