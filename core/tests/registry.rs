//! Every operation resolves to the method and path the service documents.

use tsdb_core::{resolve, Client, ClientConfig, HttpMethod, Operation};

const TABLE: [(&str, HttpMethod, &str); 17] = [
    ("CreateRepo", HttpMethod::Post, "/v4/repos/%s"),
    ("ListRepos", HttpMethod::Get, "/v4/repos"),
    ("GetRepo", HttpMethod::Get, "/v4/repos/%s"),
    ("DeleteRepo", HttpMethod::Delete, "/v4/repos/%s"),
    ("UpdateRepoMetadata", HttpMethod::Post, "/v4/repos/%s/meta"),
    ("DeleteRepoMetadata", HttpMethod::Delete, "/v4/repos/%s/meta"),
    ("CreateSeries", HttpMethod::Post, "/v4/repos/%s/series/%s"),
    ("UpdateSeriesMetadata", HttpMethod::Post, "/v4/repos/%s/series/%s/meta"),
    ("DeleteSeriesMetadata", HttpMethod::Delete, "/v4/repos/%s/series/%s/meta"),
    ("ListSeries", HttpMethod::Get, "/v4/repos/%s/series"),
    ("DeleteSeries", HttpMethod::Delete, "/v4/repos/%s/series/%s"),
    ("CreateView", HttpMethod::Post, "/v4/repos/%s/views/%s"),
    ("ListView", HttpMethod::Get, "/v4/repos/%s/views"),
    ("DeleteView", HttpMethod::Delete, "/v4/repos/%s/views/%s"),
    ("GetView", HttpMethod::Get, "/v4/repos/%s/views/%s"),
    ("QueryPoints", HttpMethod::Post, "/v4/repos/%s/query"),
    ("WritePoints", HttpMethod::Post, "/v4/repos/%s/points"),
];

/// Substitute `args` into a `%s` template the way the service docs read.
fn fill(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for arg in args {
        out = out.replacen("%s", arg, 1);
    }
    out
}

#[test]
fn every_operation_matches_the_table() {
    for (name, method, template) in TABLE {
        let spec = resolve(name).unwrap_or_else(|| panic!("{name} should resolve"));
        assert_eq!(spec.operation.name(), name);
        assert_eq!(spec.method, method, "{name}: method");
        assert_eq!(spec.template(), template, "{name}: template");
    }
}

#[test]
fn table_covers_every_operation() {
    assert_eq!(TABLE.len(), Operation::ALL.len());
    for operation in Operation::ALL {
        assert!(TABLE.iter().any(|(name, ..)| *name == operation.name()));
    }
}

#[test]
fn build_fills_templates_in_argument_order() {
    let client = Client::configure(ClientConfig::new("https://tsdb.example.com")).unwrap();
    let pool = ["repoA", "seriesB"];
    for (name, method, template) in TABLE {
        let args = &pool[..template.matches("%s").count()];
        let req = client.build::<()>(name, args, "t").unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.path, fill(template, args), "{name}: path");
    }
}

#[test]
fn unknown_names_do_not_resolve() {
    for name in ["Nonexistent", "createrepo", "CreateRepo ", "WritePoint"] {
        assert!(resolve(name).is_none(), "{name} should not resolve");
    }
}
