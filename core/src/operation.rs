//! Registry of the `/v4` operations.
//!
//! # Design
//! Every operation the service supports is a variant of the closed
//! `Operation` enum, and `OPERATIONS` maps each one to its HTTP method and a
//! structured path of literal segments and named parameter slots. Rendering a
//! path checks the argument count against the slots, so a mismatch is a
//! `BuildError` rather than a malformed URL.
//!
//! Lookup by name is exact and case-sensitive. The registry never logs; an
//! unknown name is simply `None` and the caller decides what to report.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::BuildError;
use crate::http::HttpMethod;

use self::Segment::{Literal, Param};

/// Characters escaped when an argument is placed into a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// One REST action of the `/v4` API.
///
/// The set is closed; `name()` is the identifier callers pass to
/// `Client::build` and `resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateRepo,
    ListRepos,
    GetRepo,
    DeleteRepo,
    UpdateRepoMetadata,
    DeleteRepoMetadata,
    CreateSeries,
    UpdateSeriesMetadata,
    DeleteSeriesMetadata,
    ListSeries,
    DeleteSeries,
    CreateView,
    ListView,
    DeleteView,
    GetView,
    QueryPoints,
    WritePoints,
}

impl Operation {
    pub const ALL: [Operation; 17] = [
        Operation::CreateRepo,
        Operation::ListRepos,
        Operation::GetRepo,
        Operation::DeleteRepo,
        Operation::UpdateRepoMetadata,
        Operation::DeleteRepoMetadata,
        Operation::CreateSeries,
        Operation::UpdateSeriesMetadata,
        Operation::DeleteSeriesMetadata,
        Operation::ListSeries,
        Operation::DeleteSeries,
        Operation::CreateView,
        Operation::ListView,
        Operation::DeleteView,
        Operation::GetView,
        Operation::QueryPoints,
        Operation::WritePoints,
    ];

    /// The wire identifier, e.g. `"WritePoints"`.
    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateRepo => "CreateRepo",
            Operation::ListRepos => "ListRepos",
            Operation::GetRepo => "GetRepo",
            Operation::DeleteRepo => "DeleteRepo",
            Operation::UpdateRepoMetadata => "UpdateRepoMetadata",
            Operation::DeleteRepoMetadata => "DeleteRepoMetadata",
            Operation::CreateSeries => "CreateSeries",
            Operation::UpdateSeriesMetadata => "UpdateSeriesMetadata",
            Operation::DeleteSeriesMetadata => "DeleteSeriesMetadata",
            Operation::ListSeries => "ListSeries",
            Operation::DeleteSeries => "DeleteSeries",
            Operation::CreateView => "CreateView",
            Operation::ListView => "ListView",
            Operation::DeleteView => "DeleteView",
            Operation::GetView => "GetView",
            Operation::QueryPoints => "QueryPoints",
            Operation::WritePoints => "WritePoints",
        }
    }

    pub fn spec(self) -> &'static OperationSpec {
        // OPERATIONS is laid out in declaration order.
        &OPERATIONS[self as usize]
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = BuildError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        resolve(name)
            .map(|spec| spec.operation)
            .ok_or_else(|| BuildError::UnknownOperation(name.to_string()))
    }
}

/// One segment of an operation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Literal(&'static str),
    /// A slot filled positionally from the caller's path arguments.
    Param(&'static str),
}

/// HTTP method and path shape of one `Operation`.
///
/// Static: every value lives in `OPERATIONS`.
#[derive(Debug, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation: Operation,
    pub method: HttpMethod,
    pub segments: &'static [Segment],
}

impl OperationSpec {
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Param(_)))
            .count()
    }

    /// Names of the parameter slots in the order arguments fill them.
    pub fn param_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(*name),
            Segment::Literal(_) => None,
        })
    }

    /// The path with `%s` in every parameter slot, e.g. `/v4/repos/%s/query`.
    pub fn template(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => format!("/{text}"),
                Segment::Param(_) => "/%s".to_string(),
            })
            .collect()
    }

    /// Fill the parameter slots with `args`, in order, verbatim.
    pub fn render(&self, args: &[&str]) -> Result<String, BuildError> {
        self.fill(args, |path, arg| path.push_str(arg))
    }

    /// Like `render`, but each argument is escaped as a URL path segment.
    pub fn render_encoded(&self, args: &[&str]) -> Result<String, BuildError> {
        self.fill(args, |path, arg| path.extend(utf8_percent_encode(arg, PATH_SEGMENT)))
    }

    fn fill<F>(&self, args: &[&str], mut push_arg: F) -> Result<String, BuildError>
    where
        F: FnMut(&mut String, &str),
    {
        let expected = self.param_count();
        if args.len() != expected {
            return Err(BuildError::PathArity {
                operation: self.operation.name(),
                expected,
                actual: args.len(),
            });
        }

        let mut args = args.iter();
        let mut path = String::new();
        for segment in self.segments {
            path.push('/');
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param(_) => {
                    if let Some(arg) = args.next() {
                        push_arg(&mut path, arg);
                    }
                }
            }
        }
        Ok(path)
    }
}

const REPOS: &[Segment] = &[Literal("v4"), Literal("repos")];
const REPO: &[Segment] = &[Literal("v4"), Literal("repos"), Param("repo")];
const REPO_META: &[Segment] = &[Literal("v4"), Literal("repos"), Param("repo"), Literal("meta")];
const SERIES_LIST: &[Segment] = &[Literal("v4"), Literal("repos"), Param("repo"), Literal("series")];
const SERIES: &[Segment] = &[
    Literal("v4"),
    Literal("repos"),
    Param("repo"),
    Literal("series"),
    Param("series"),
];
const SERIES_META: &[Segment] = &[
    Literal("v4"),
    Literal("repos"),
    Param("repo"),
    Literal("series"),
    Param("series"),
    Literal("meta"),
];
const VIEWS: &[Segment] = &[Literal("v4"), Literal("repos"), Param("repo"), Literal("views")];
const VIEW: &[Segment] = &[
    Literal("v4"),
    Literal("repos"),
    Param("repo"),
    Literal("views"),
    Param("view"),
];
const QUERY: &[Segment] = &[Literal("v4"), Literal("repos"), Param("repo"), Literal("query")];
const POINTS: &[Segment] = &[Literal("v4"), Literal("repos"), Param("repo"), Literal("points")];

const fn op(operation: Operation, method: HttpMethod, segments: &'static [Segment]) -> OperationSpec {
    OperationSpec {
        operation,
        method,
        segments,
    }
}

/// Every supported operation, in `Operation` declaration order.
pub static OPERATIONS: [OperationSpec; 17] = [
    op(Operation::CreateRepo, HttpMethod::Post, REPO),
    op(Operation::ListRepos, HttpMethod::Get, REPOS),
    op(Operation::GetRepo, HttpMethod::Get, REPO),
    op(Operation::DeleteRepo, HttpMethod::Delete, REPO),
    op(Operation::UpdateRepoMetadata, HttpMethod::Post, REPO_META),
    op(Operation::DeleteRepoMetadata, HttpMethod::Delete, REPO_META),
    op(Operation::CreateSeries, HttpMethod::Post, SERIES),
    op(Operation::UpdateSeriesMetadata, HttpMethod::Post, SERIES_META),
    op(Operation::DeleteSeriesMetadata, HttpMethod::Delete, SERIES_META),
    op(Operation::ListSeries, HttpMethod::Get, SERIES_LIST),
    op(Operation::DeleteSeries, HttpMethod::Delete, SERIES),
    op(Operation::CreateView, HttpMethod::Post, VIEW),
    op(Operation::ListView, HttpMethod::Get, VIEWS),
    op(Operation::DeleteView, HttpMethod::Delete, VIEW),
    op(Operation::GetView, HttpMethod::Get, VIEW),
    op(Operation::QueryPoints, HttpMethod::Post, QUERY),
    op(Operation::WritePoints, HttpMethod::Post, POINTS),
];

/// Look up an operation by its exact identifier.
pub fn resolve(name: &str) -> Option<&'static OperationSpec> {
    OPERATIONS.iter().find(|spec| spec.operation.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_in_declaration_order() {
        for (index, operation) in Operation::ALL.iter().enumerate() {
            assert_eq!(OPERATIONS[index].operation, *operation);
            assert_eq!(operation.spec().operation, *operation);
        }
    }

    #[test]
    fn resolve_list_repos() {
        let spec = resolve("ListRepos").unwrap();
        assert_eq!(spec.method, HttpMethod::Get);
        assert_eq!(spec.template(), "/v4/repos");
        assert_eq!(spec.param_count(), 0);
    }

    #[test]
    fn resolve_is_exact_match() {
        assert!(resolve("listrepos").is_none());
        assert!(resolve("ListRepo").is_none());
        assert!(resolve(" ListRepos").is_none());
        assert!(resolve("").is_none());
    }

    #[test]
    fn from_str_round_trips_names() {
        for operation in Operation::ALL {
            assert_eq!(operation.name().parse::<Operation>().unwrap(), operation);
        }
        assert_eq!(
            "Nonexistent".parse::<Operation>().unwrap_err(),
            BuildError::UnknownOperation("Nonexistent".to_string())
        );
    }

    #[test]
    fn render_substitutes_in_order() {
        let path = Operation::CreateSeries.spec().render(&["repoA", "seriesB"]).unwrap();
        assert_eq!(path, "/v4/repos/repoA/series/seriesB");
    }

    #[test]
    fn render_rejects_too_few_arguments() {
        let err = Operation::CreateSeries.spec().render(&["repoA"]).unwrap_err();
        assert_eq!(
            err,
            BuildError::PathArity {
                operation: "CreateSeries",
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn render_rejects_extra_arguments() {
        let err = Operation::ListRepos.spec().render(&["surplus"]).unwrap_err();
        assert!(matches!(err, BuildError::PathArity { expected: 0, actual: 1, .. }));
    }

    #[test]
    fn render_keeps_arguments_verbatim() {
        let path = Operation::GetView.spec().render(&["my repo", "a/b?c"]).unwrap();
        assert_eq!(path, "/v4/repos/my repo/views/a/b?c");
    }

    #[test]
    fn render_encoded_escapes_reserved_characters() {
        let path = Operation::GetView.spec().render_encoded(&["my repo", "a/b?c"]).unwrap();
        assert_eq!(path, "/v4/repos/my%20repo/views/a%2Fb%3Fc");
    }

    #[test]
    fn render_encoded_checks_arity_too() {
        let err = Operation::QueryPoints.spec().render_encoded(&[]).unwrap_err();
        assert!(matches!(err, BuildError::PathArity { expected: 1, actual: 0, .. }));
    }

    #[test]
    fn param_names_follow_path_order() {
        let names: Vec<_> = Operation::DeleteSeriesMetadata.spec().param_names().collect();
        assert_eq!(names, vec!["repo", "series"]);
    }
}
