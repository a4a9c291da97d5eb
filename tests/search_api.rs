use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use ricerca::{
    AnalyzerKind, BooleanOperator, Config, Document, ErrorKind, FileSource, Index, Query, Schema,
};

fn articles_schema() -> Schema {
    Schema::builder()
        .stored_text_field("title", AnalyzerKind::standard_with_stop_words(["the", "a"]))
        .text_field("body", AnalyzerKind::standard_with_stop_words(["the", "a"]))
        .stored_text_field("file", AnalyzerKind::FileName)
        .keyword_field("path")
        .default_search_fields(["title", "body"])
        .build()
        .unwrap()
}

fn article(title: &str, body: &str, path: &str) -> Document {
    Document::new()
        .with_field("title", title)
        .with_field("body", body)
        .with_field("file", path.rsplit('/').next().unwrap_or(path))
        .with_field("path", path)
}

#[test]
fn test_index_directory_and_search() {
    let docs = TempDir::new().unwrap();
    fs::write(docs.path().join("volpe.txt"), "la volpe corre nel bosco").unwrap();
    fs::write(docs.path().join("lupo.html"), "<p>il lupo e la volpe</p>").unwrap();
    fs::write(docs.path().join("rotto.txt"), [0xc3u8, 0x28]).unwrap();

    let store = TempDir::new().unwrap();
    let index = Index::open(Schema::file_documents().unwrap(), Config::persistent(store.path())).unwrap();
    let mut writer = index.writer().unwrap();

    let mut paths: Vec<_> = fs::read_dir(docs.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    let report = writer.add_sources(paths.into_iter().map(FileSource::new)).unwrap();
    assert_eq!(report.added_count(), 2);
    let skipped: Vec<&str> = report.skipped().map(|(identity, _)| identity).collect();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].ends_with("rotto.txt"));

    let info = writer.commit().unwrap();
    assert_eq!(info.added, 2);
    assert_eq!(info.total_documents, 2);

    let page = index.searcher().search("volpe", Some(5)).unwrap();
    assert_eq!(page.total_hits, 2);
    assert!(page.hits.iter().all(|hit| hit.path.is_some()));

    let page = index.searcher().search("nome:lupo.html", Some(5)).unwrap();
    assert_eq!(page.total_hits, 1);
    assert!(page.hits[0].path.as_deref().unwrap().ends_with("lupo.html"));
}

#[test]
fn test_file_name_field_matches_without_extension() {
    let index = Index::in_memory(articles_schema()).unwrap();
    let mut writer = index.writer().unwrap();
    writer.add_document(article("Quarterly Report", "numbers", "/srv/Report.PDF")).unwrap();
    writer.commit().unwrap();

    let searcher = index.searcher();
    assert_eq!(searcher.search("file:report", None).unwrap().total_hits, 1);
    assert_eq!(searcher.search("file:REPORT.pdf", None).unwrap().total_hits, 1);
    assert_eq!(searcher.search("path:/srv/Report.PDF", None).unwrap().total_hits, 1);
    assert_eq!(searcher.search("path:/srv/report.pdf", None).unwrap().total_hits, 0);
}

#[test]
fn test_query_operators_end_to_end() {
    let index = Index::in_memory(articles_schema()).unwrap();
    let mut writer = index.writer().unwrap();
    writer.add_document(article("Rust parsers", "writing a lexer by hand", "/1")).unwrap();
    writer.add_document(article("Go services", "a lexer in go", "/2")).unwrap();
    writer.add_document(article("The garden", "tomatoes and basil", "/3")).unwrap();
    writer.commit().unwrap();

    let searcher = index.searcher();
    let ids = |q: &str| -> Vec<u64> {
        let mut ids: Vec<u64> = searcher
            .matching_docs(&searcher.parse(q).unwrap())
            .into_iter()
            .map(|id| id.value())
            .collect();
        ids.sort();
        ids
    };

    assert_eq!(ids("lexer"), vec![1, 2]);
    assert_eq!(ids("lexer rust"), vec![1]);
    assert_eq!(ids("lexer AND (rust OR go)"), vec![1, 2]);
    assert_eq!(ids("title:garden OR body:hand"), vec![1, 3]);
    assert_eq!(ids("the"), Vec::<u64>::new());
    assert!(searcher.parse("the").unwrap().is_match_none());

    let err = searcher.search("lexer AND", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::QuerySyntax);
    assert!(err.is_recoverable());
    assert_eq!(searcher.search("author:me", None).unwrap_err().kind(), ErrorKind::UnknownField);

    let runaway = format!("{}lexer{}", "(".repeat(5000), ")".repeat(5000));
    assert_eq!(searcher.search(&runaway, None).unwrap_err().kind(), ErrorKind::QuerySyntax);
    assert_eq!(searcher.search("((lexer) AND (go))", None).unwrap().total_hits, 1);
}

#[test]
fn test_default_operator_from_config() {
    let config = Config::from_json_str(r#"{"default_operator": "Or", "default_limit": 1}"#).unwrap();
    assert_eq!(config.default_operator, BooleanOperator::Or);
    let index = Index::open(articles_schema(), config).unwrap();
    let mut writer = index.writer().unwrap();
    writer.add_document(article("alpha", "one", "/1")).unwrap();
    writer.add_document(article("beta", "two", "/2")).unwrap();
    writer.commit().unwrap();

    let page = index.searcher().search("alpha beta", None).unwrap();
    assert_eq!(page.total_hits, 2);
    assert_eq!(page.hits.len(), 1);
}

#[test]
fn test_readers_run_while_writer_commits() {
    let index = Arc::new(Index::in_memory(articles_schema()).unwrap());
    let mut writer = index.writer().unwrap();
    writer.add_document(article("seed", "volpe", "/0")).unwrap();
    writer.commit().unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let index = index.clone();
            thread::spawn(move || {
                let mut last_seen = 0;
                for _ in 0..200 {
                    let searcher = index.searcher();
                    let page = searcher.search("volpe", Some(100)).unwrap();
                    // Committed batches add two documents each, never one
                    assert_eq!(page.total_hits % 2, 1);
                    assert!(page.total_hits >= last_seen);
                    assert_eq!(page.total_hits, searcher.num_docs());
                    last_seen = page.total_hits;
                }
            })
        })
        .collect();

    for i in 0..20 {
        writer.add_document(article("batch", "volpe", &format!("/{}a", i))).unwrap();
        writer.add_document(article("batch", "volpe", &format!("/{}b", i))).unwrap();
        writer.commit().unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(index.searcher().num_docs(), 41);
}

#[test]
fn test_query_tree_can_be_built_directly() {
    let index = Index::in_memory(articles_schema()).unwrap();
    let mut writer = index.writer().unwrap();
    writer.add_document(article("alpha", "shared", "/1")).unwrap();
    writer.add_document(article("beta", "shared shared", "/2")).unwrap();
    writer.commit().unwrap();

    let searcher = index.searcher();
    let query = Query::and(vec![Query::term("body", "shared"), Query::term("title", "beta")]);
    let results = searcher.evaluate(&query, 10);
    assert_eq!(results.total_hits, 1);
    assert_eq!(results.hits[0].doc_id.value(), 2);
    assert_eq!(searcher.document(results.hits[0].doc_id).unwrap()["title"], "beta");
}
