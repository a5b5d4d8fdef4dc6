use std::fs;

mod common;

use common::{parse_json, stdout, Shop, CATALOG_CSV};

#[test]
fn cache_show_reports_a_fresh_envelope_after_loading() {
    let shop = Shop::new(Some(CATALOG_CSV));

    let assert = shop.json(&["cache", "show"]).success();
    assert_eq!(parse_json(&assert)["details"]["status"], "empty");

    shop.json(&["stats"]).success();
    let assert = shop.json(&["cache", "show"]).success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["status"], "fresh");
    assert_eq!(payload["details"]["items"], 4);
    assert_eq!(payload["details"]["key"], "gamesData");
    assert!(shop.data_dir().join("gamesData.json").exists());
}

#[test]
fn fresh_cache_wins_over_a_changed_local_file() {
    let shop = Shop::new(Some(CATALOG_CSV));
    shop.json(&["stats"]).success();

    let smaller = "id,name,category,price,rating\n1,Solo,Puzzle,5,3\n";
    fs::write(shop.root().join("games.csv"), smaller).expect("rewrite csv");

    let assert = shop.json(&["stats"]).success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["statistics"]["total"], 4);
    assert_eq!(payload["details"]["load"]["source"]["kind"], "cache");

    shop.json(&["cache", "clear"]).success();
    let assert = shop.json(&["stats"]).success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["statistics"]["total"], 1);
    assert_eq!(payload["details"]["statistics"]["top_rated"], "Solo");
}

#[test]
fn stale_cache_is_shown_then_refreshed() {
    let shop = Shop::new(Some(CATALOG_CSV));
    fs::create_dir_all(shop.data_dir()).expect("data dir");
    let stale = serde_json::json!({
        "games": [{ "id": 9, "name": "Old Game", "category": "Retro", "price": 1.0, "rating": 2.0 }],
        "lastFetchTime": 0,
    });
    fs::write(shop.data_dir().join("gamesData.json"), stale.to_string()).expect("seed cache");

    let assert = shop.json(&["cache", "show"]).success();
    assert_eq!(parse_json(&assert)["details"]["status"], "stale");

    let assert = shop.json(&["catalog"]).success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["total"], 4);
    assert_eq!(payload["details"]["load"]["used_cache"], true);
}

#[test]
fn cache_path_names_the_data_directory() {
    let shop = Shop::new(None);

    let assert = shop.cmd().args(["cache", "path"]).assert().success();
    let out = stdout(&assert);
    assert!(out.contains("storefront cache path: data directory:"), "{out}");

    let assert = shop.json(&["cache", "path"]).success();
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["source"], "STOREFRONT_DATA_PATH");
    assert_eq!(
        payload["details"]["path"],
        shop.data_dir().display().to_string()
    );
}
