//! End-to-end microdata flattening through the configured pipeline, covering
//! both nested-value disambiguation modes on a realistic product page.

use crawlsift::{FetchedPage, ParserConfig, Pipeline};

/// A product page with two offers, in the shape commerce sites actually ship.
const PRODUCT_PAGE: &[u8] = br#"<html>
<head><title>Kempton Small Tote</title></head>
<body>
    <div itemscope itemtype="http://schema.org/WebPage">
        <span itemprop="breadcrumb">Women - Bags</span>
    </div>
    <div itemscope itemtype="http://schema.org/Product">
        <h1 itemprop="name">Kempton Small Tote</h1>
        <meta itemprop="productID" content="1668293">
        <img itemprop="image" src="http://images.example.com/1668293.jpg">
        <div itemprop="offers" itemscope itemtype="http://schema.org/Offer">
            <span itemprop="price">$74.99</span>
            <meta itemprop="priceCurrency" content="USD">
            <link itemprop="availability" href="http://schema.org/InStock">
        </div>
        <div itemprop="offers" itemscope itemtype="http://schema.org/Offer">
            <span itemprop="price">$89.99</span>
            <meta itemprop="priceCurrency" content="USD">
        </div>
    </div>
</body></html>"#;

fn run(config_json: &str) -> crawlsift::ParseResult {
    let config = ParserConfig::from_json_str(config_json).expect("valid config");
    Pipeline::new(&config)
        .expect("config compiles")
        .process(FetchedPage::new(
            "http://www.example.com/product/1668293",
            PRODUCT_PAGE.to_vec(),
        ))
        .parsed()
        .expect("parses")
}

const MERGE_CONFIG: &str = r#"{ "parse_filters": [ { "name": "microdata" } ] }"#;

const UNIQUE_CONFIG: &str = r#"{
    "parse_filters": [
        { "name": "microdata",
          "params": { "useUniquePrefixForNestedValues": true } }
    ]
}"#;

#[test]
fn merge_mode_flattens_top_level_scopes() {
    let result = run(MERGE_CONFIG);
    let metadata = &result.metadata;

    assert_eq!(metadata.values("microdata.webpage.breadcrumb"), ["Women - Bags"]);
    assert_eq!(metadata.values("microdata.product.name"), ["Kempton Small Tote"]);
    assert_eq!(metadata.values("microdata.product.productID"), ["1668293"]);
    assert_eq!(
        metadata.values("microdata.product.image"),
        ["http://images.example.com/1668293.jpg"]
    );
}

#[test]
fn merge_mode_accumulates_offer_values_in_encounter_order() {
    let result = run(MERGE_CONFIG);
    let metadata = &result.metadata;

    assert_eq!(
        metadata.values("microdata.product.offers.price"),
        ["$74.99", "$89.99"]
    );
    assert_eq!(
        metadata.values("microdata.product.offers.priceCurrency"),
        ["USD", "USD"]
    );
    assert_eq!(
        metadata.values("microdata.product.offers.availability"),
        ["http://schema.org/InStock"]
    );
}

#[test]
fn unique_mode_gives_each_offer_its_own_prefix() {
    let result = run(UNIQUE_CONFIG);
    let metadata = &result.metadata;

    assert_eq!(metadata.values("microdata.product.offers.0.price"), ["$74.99"]);
    assert_eq!(metadata.values("microdata.product.offers.1.price"), ["$89.99"]);
    assert_eq!(
        metadata.values("microdata.product.offers.0.availability"),
        ["http://schema.org/InStock"]
    );
    assert!(!metadata.contains_key("microdata.product.offers.price"));

    // Non-nested properties are unaffected by the mode.
    assert_eq!(metadata.values("microdata.product.name"), ["Kempton Small Tote"]);
}

#[test]
fn include_errors_collects_item_problems_without_failing() {
    let config = r#"{
        "parse_filters": [
            { "name": "microdata", "params": { "includeErrors": true } }
        ]
    }"#;
    let page = br#"<html><body>
        <div itemscope itemtype="http://schema.org/Article">
            <span itemprop="headline">Fine</span>
            <time itemprop="datePublished" datetime="garbage">?</time>
        </div>
        <div itemscope itemtype="http://schema.org/Product">
            <span itemprop="name">Still extracted</span>
        </div>
    </body></html>"#;

    let result = Pipeline::new(&ParserConfig::from_json_str(config).expect("valid config"))
        .expect("config compiles")
        .process(FetchedPage::new("http://a.com/", page.to_vec()))
        .parsed()
        .expect("item errors never fail the document");

    assert_eq!(result.metadata.values("microdata.article.headline"), ["Fine"]);
    assert_eq!(
        result.metadata.values("microdata.product.name"),
        ["Still extracted"]
    );
    assert!(!result.metadata.values("microdata.errors").is_empty());
}

#[test]
fn pages_without_microdata_leave_metadata_untouched() {
    let result = Pipeline::new(&ParserConfig::from_json_str(MERGE_CONFIG).expect("valid config"))
        .expect("config compiles")
        .process(FetchedPage::new(
            "http://a.com/",
            b"<html><body><p>plain page</p></body></html>".to_vec(),
        ))
        .parsed()
        .expect("parses");

    assert!(result.metadata.is_empty());
}
