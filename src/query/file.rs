//! File-based query backend.
//!
//! Answers every query from a JSON file holding a saved backend response.
//! Useful offline and for demos; the file is re-read on every query so it
//! can be edited while the viewer runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ProfileQuery, QueryError, QueryRequest, QueryResponse};

/// A query backend that replays a saved response from disk.
///
/// Only the diagram types a request asks for are returned, so a
/// callgraph-only request does not overwrite table data and vice versa.
#[derive(Debug)]
pub struct FileQuery {
    path: PathBuf,
    description: String,
}

impl FileQuery {
    /// Create a new file backend for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProfileQuery for FileQuery {
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let content = tokio::fs::read(&self.path).await?;
        let mut response = QueryResponse::from_slice(&content)?;

        if let Some(ref mut diagrams) = response.diagrams {
            diagrams.retain(&request.diagram_types);
        }
        Ok(response)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DiagramType, TimeRange};
    use crate::query::QueryParams;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn fixture() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"diagrams": {{
                "unit": "nanoseconds",
                "table_data": [{{"id": 1, "name": "main", "self": 5, "total": 10}}],
                "flame_data": {{"id": 0, "name": "total", "value": 10, "children": []}},
                "call_graph_data": "digraph {{ a -> b }}"
            }}}}"#
        )
        .unwrap();
        file
    }

    fn request(types: &[DiagramType]) -> QueryRequest {
        QueryRequest::new(
            &QueryParams::new(),
            &TimeRange::last(Duration::from_secs(60)),
            types,
        )
    }

    #[tokio::test]
    async fn test_file_query_filters_types() {
        let file = fixture();
        let source = FileQuery::new(file.path());

        let response = source
            .query(&request(&[DiagramType::Table, DiagramType::Flamegraph]))
            .await
            .unwrap();
        let diagrams = response.diagrams.unwrap();
        assert_eq!(diagrams.unit, "nanoseconds");
        assert_eq!(diagrams.table_data.len(), 1);
        assert!(diagrams.flame_data.is_some());
        assert!(diagrams.call_graph_data.is_none());

        let topo = source
            .query(&request(&[DiagramType::Callgraph]))
            .await
            .unwrap()
            .diagrams
            .unwrap();
        assert!(topo.table_data.is_empty());
        assert_eq!(topo.topo_source(), "digraph { a -> b }");
    }

    #[tokio::test]
    async fn test_file_query_missing_file() {
        let source = FileQuery::new("/nonexistent/profile.json");
        let result = source.query(&request(&[DiagramType::Table])).await;
        assert!(matches!(result, Err(QueryError::Io(_))));
    }

    #[tokio::test]
    async fn test_file_query_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let source = FileQuery::new(file.path());
        let result = source.query(&request(&[DiagramType::Table])).await;
        assert!(matches!(result, Err(QueryError::Parse(_))));
    }

    #[tokio::test]
    async fn test_file_query_deep_flame_tree() {
        let depth = 400;
        let mut flame = String::new();
        for i in 0..depth {
            flame.push_str(&format!(
                r#"{{"id": {}, "name": "frame{}", "value": 1, "children": ["#,
                i, i
            ));
        }
        flame.push_str(&"]}".repeat(depth));

        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"result": true, "data": {{"diagrams": {{"unit": "nanoseconds", "flame_data": {}}}}}}}"#,
            flame
        )
        .unwrap();

        let source = FileQuery::new(file.path());
        let diagrams = source
            .query(&request(&[DiagramType::Flamegraph]))
            .await
            .unwrap()
            .diagrams
            .unwrap();
        assert_eq!(diagrams.flame_data.unwrap().depth(), depth);
    }

    #[test]
    fn test_file_query_description() {
        let source = FileQuery::new("/tmp/profile.json");
        assert_eq!(source.description(), "file: /tmp/profile.json");
        assert_eq!(source.path(), Path::new("/tmp/profile.json"));
    }
}
