//! End-to-end analysis over a small design-research corpus.

use std::collections::{BTreeMap, BTreeSet};

use design_metrics::Table;
use design_metrics::clean::{dedupe_papers, normalize_authors, validate_schema};
use design_metrics::filter::{KeywordOptions, RuleSet, by_keywords, label_by_rules};
use design_metrics::graphs::{CommunityOptions, coauthors, communities, stats};
use design_metrics::models::KeywordMode;
use design_metrics::refs::{CitationOptions, in_corpus_citations};
use design_metrics::topics::{TopicOptions, describe, doc_topics, fit};
use design_metrics::{geo, metrics};
use serde_json::json;

fn table(value: serde_json::Value) -> Table {
    Table::from_json_str(&value.to_string()).unwrap()
}

fn sample_tables() -> BTreeMap<String, Table> {
    let papers = table(json!([
        {
            "paper_id": "P1",
            "title": "Deep Learning for Building Information Modelling",
            "year": 2021,
            "venue": "CAADRIA",
            "abstract": "We explore deep learning techniques for BIM coordination.",
            "keywords": ["deep learning", "BIM"]
        },
        {
            "paper_id": "P2",
            "title": "GAN-assisted Urban Design",
            "year": 2022,
            "venue": "CAAD Futures",
            "abstract": "Generative adversarial networks enable new design workflows.",
            "keywords": "GAN; urban design"
        },
        {
            "paper_id": "P3",
            "title": "Rule-based Planning Systems",
            "year": 2019,
            "venue": "CAADRIA",
            "abstract": "Rule-based approaches complement data-driven methods.",
            "keywords": "rule-based; planning"
        },
        {
            "paper_id": "P4",
            "title": "Deep Learning for Building Information Modeling",
            "year": 2021,
            "venue": "ACADIA",
            "abstract": "A survey of deep learning applications in BIM.",
            "keywords": ["deep learning", "BIM"]
        }
    ]));
    let authors = table(json!([
        {"author_id": "A1", "name": "alice tan"},
        {"author_id": "A2", "name": "BOB LEE"},
        {"author_id": "A3", "name": " Carla  Gomez "},
        {"author_id": "A4", "name": "Daniel Ito"}
    ]));
    let authorships = table(json!([
        {"paper_id": "P1", "author_id": "A1"},
        {"paper_id": "P1", "author_id": "A2"},
        {"paper_id": "P2", "author_id": "A2"},
        {"paper_id": "P2", "author_id": "A3"},
        {"paper_id": "P3", "author_id": "A4"},
        {"paper_id": "P4", "author_id": "A1"}
    ]));
    let affiliations = table(json!([
        {"paper_id": "P1", "author_id": "A1", "institution_id": "I1", "country": "Singapore"},
        {"paper_id": "P1", "author_id": "A2", "institution_id": "I2", "country": "Switzerland"},
        {"paper_id": "P2", "author_id": "A2", "institution_id": "I3", "country": "Japan"},
        {"paper_id": "P3", "author_id": "A4", "institution_id": "I4", "country": "Australia"}
    ]));
    let references = table(json!([
        {
            "citing_paper_id": "P2",
            "cited_text": "Smith, Deep Learning for Building Information Modelling, 2021"
        },
        {"citing_paper_id": "P3", "cited_text": "Tan et al., Deep Learning for BIM, 2021"}
    ]));

    [
        ("papers", papers),
        ("authors", authors),
        ("authorships", authorships),
        ("affiliations", affiliations),
        ("references", references),
    ]
    .into_iter()
    .map(|(name, t)| (name.to_string(), t))
    .collect()
}

fn ids(table: &Table) -> BTreeSet<String> {
    table.rows().map(|r| r.text("paper_id")).collect()
}

#[test]
fn test_analysis_end_to_end() {
    let tables = sample_tables();

    let report = validate_schema(&tables);
    assert!(report.ok(), "{:?}", report.issues);

    let deduped = dedupe_papers(&tables["papers"], 0.9).unwrap();
    assert_eq!(deduped.len(), 3);

    let authors = normalize_authors(&tables["authors"]).unwrap();
    assert_eq!(authors.row(0).text("name"), "Tan, A.");
    assert_eq!(authors.row(0).text("name_raw"), "alice tan");

    let subset = by_keywords(
        &deduped,
        &["deep learning", "gan", "bim"],
        &KeywordOptions::new(KeywordMode::Lemma),
    )
    .unwrap();
    assert_eq!(ids(&subset), BTreeSet::from(["P1".to_string(), "P2".to_string()]));

    let rules = RuleSet::from_value(json!({
        "rules": [
            {"label": "AI", "any": ["deep learning", "gan"]},
            {"label": "Planning", "match": "all", "terms": ["rule", "planning"]}
        ]
    }))
    .unwrap();
    let labelled = label_by_rules(&deduped, &rules, "labels").unwrap();
    let p3 = labelled.rows().find(|r| r.text("paper_id") == "P3").unwrap();
    assert_eq!(p3.get("labels"), Some(&json!(["Planning"])));

    let trend = metrics::trend(&subset, "year", &["venue"], None).unwrap();
    for column in ["year", "venue", "count"] {
        assert!(trend.has_column(column));
    }

    let top = metrics::topk(&subset, "keywords", 2, Some(";")).unwrap();
    let first = top.row(0).text("keywords").to_lowercase();
    assert!(first == "deep learning" || first == "gan", "{first}");

    let abstracts: Vec<String> = subset.rows().map(|r| r.text("abstract")).collect();
    let model = fit(&abstracts, &TopicOptions { k: 2, random_state: 0, ..TopicOptions::default() }).unwrap();
    assert_eq!(describe(&model, 5).unwrap().len(), 2);
    let weights = doc_topics(&model).unwrap();
    assert_eq!(weights.columns(), &["document_id", "topic_0", "topic_1"]);

    let graph = coauthors(&tables["authorships"], "paper_id", "author_id").unwrap();
    assert!(stats(&graph).nodes >= 4);
    let groups = communities(&graph, &CommunityOptions::default()).unwrap();
    assert_eq!(groups.columns(), &["node", "community"]);

    let countries = geo::aggregate(&tables["affiliations"], "country").unwrap();
    assert!(!countries.is_empty());

    let options = CitationOptions {
        reference_column: "cited_text".to_string(),
        paper_id_column: "citing_paper_id".to_string(),
        corpus_id_column: Some("paper_id".to_string()),
        ..CitationOptions::default()
    };
    let citations = in_corpus_citations(&tables["references"], &deduped, &options).unwrap();
    assert!(!citations.edges.is_empty());
    let p1 = citations.indegree.rows().find(|r| r.text("paper_id") == "P1").unwrap();
    assert!(p1.get("indegree").and_then(serde_json::Value::as_i64).unwrap() >= 1);
}

#[test]
fn test_schema_reports_dangling_ids() {
    let mut tables = sample_tables();
    tables.insert(
        "authorships".to_string(),
        table(json!([{"paper_id": "P9", "author_id": "A1"}, {"paper_id": "P1", "author_id": "A7"}])),
    );
    let report = validate_schema(&tables);
    assert!(!report.ok());
    let messages: Vec<&str> = report.issues.iter().map(|i| i.message.as_str()).collect();
    assert!(messages.contains(&"Unknown paper ids: P9"));
    assert!(messages.contains(&"Unknown author ids: A7"));
    assert_eq!(report.to_table().unwrap().len(), 2);
}

#[test]
fn test_schema_requires_papers() {
    let mut tables = sample_tables();
    tables.remove("papers");
    let report = validate_schema(&tables);
    assert_eq!(report.issues[0].table, "papers");
    assert_eq!(report.issues[0].message, "required table is missing");
}

#[test]
fn test_dedupe_by_doi() {
    let papers = table(json!([
        {"paper_id": "P1", "title": "Robotic timber assembly", "doi": "10.1/X"},
        {"paper_id": "P2", "title": "Entirely different", "doi": "10.1/x"},
        {"paper_id": "P3", "title": "Another study", "doi": null}
    ]));
    let deduped = dedupe_papers(&papers, 0.9).unwrap();
    assert_eq!(ids(&deduped), BTreeSet::from(["P1".to_string(), "P3".to_string()]));
}
