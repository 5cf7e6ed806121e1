//! Table resources
//!
//! A [`DataFrameViewSet`] presents one table through a record-oriented
//! contract: list, retrieve, create, update (full or partial) and destroy.
//! Which of these a resource answers is decided by its [`Actions`], so the
//! usual combinations (read-only, list+create, retrieve+update+destroy, ...)
//! are just different sets.

use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::dto::DatasetSummary;
use crate::domain::{parse_label, DataFrame, DomainError, DomainResult};
use crate::infrastructure::DataFrameSource;
use crate::pagination::{LimitOffsetPagination, PageControls, PaginatedResponse};
use crate::serializers::FrameSerializer;

/// Single operation on a table resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    /// HTTP method serving this action
    pub fn method(&self) -> &'static str {
        match self {
            Self::List | Self::Retrieve => "GET",
            Self::Create => "POST",
            Self::Update => "PUT",
            Self::PartialUpdate => "PATCH",
            Self::Destroy => "DELETE",
        }
    }
}

/// Set of enabled operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actions {
    pub list: bool,
    pub retrieve: bool,
    pub create: bool,
    pub update: bool,
    pub destroy: bool,
}

impl Actions {
    pub const NONE: Self = Self {
        list: false,
        retrieve: false,
        create: false,
        update: false,
        destroy: false,
    };
    pub const LIST: Self = Self { list: true, ..Self::NONE };
    pub const RETRIEVE: Self = Self { retrieve: true, ..Self::NONE };
    pub const CREATE: Self = Self { create: true, ..Self::NONE };
    pub const UPDATE: Self = Self { update: true, ..Self::NONE };
    pub const DESTROY: Self = Self { destroy: true, ..Self::NONE };

    pub const LIST_CREATE: Self = Self::LIST.union(Self::CREATE);
    pub const RETRIEVE_UPDATE: Self = Self::RETRIEVE.union(Self::UPDATE);
    pub const RETRIEVE_DESTROY: Self = Self::RETRIEVE.union(Self::DESTROY);
    pub const RETRIEVE_UPDATE_DESTROY: Self = Self::RETRIEVE_UPDATE.union(Self::DESTROY);
    pub const READ_ONLY: Self = Self::LIST.union(Self::RETRIEVE);
    pub const ALL: Self = Self::READ_ONLY.union(Self::CREATE).union(Self::UPDATE).union(Self::DESTROY);

    pub const fn union(self, other: Self) -> Self {
        Self {
            list: self.list || other.list,
            retrieve: self.retrieve || other.retrieve,
            create: self.create || other.create,
            update: self.update || other.update,
            destroy: self.destroy || other.destroy,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::List => self.list,
            Action::Retrieve => self.retrieve,
            Action::Create => self.create,
            Action::Update | Action::PartialUpdate => self.update,
            Action::Destroy => self.destroy,
        }
    }

    pub fn names(&self) -> Vec<String> {
        [
            (self.list, "list"),
            (self.retrieve, "retrieve"),
            (self.create, "create"),
            (self.update, "update"),
            (self.destroy, "destroy"),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, name)| name.to_string())
        .collect()
    }

    /// Parse action names and presets (`all`, `read_only`, `list_create`, ...)
    pub fn from_names<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().try_fold(Self::NONE, |acc, name| {
            let one = match name.as_ref().to_lowercase().replace('-', "_").as_str() {
                "list" => Self::LIST,
                "retrieve" => Self::RETRIEVE,
                "create" => Self::CREATE,
                "update" => Self::UPDATE,
                "destroy" => Self::DESTROY,
                "list_create" => Self::LIST_CREATE,
                "retrieve_update" => Self::RETRIEVE_UPDATE,
                "retrieve_destroy" => Self::RETRIEVE_DESTROY,
                "retrieve_update_destroy" => Self::RETRIEVE_UPDATE_DESTROY,
                "read_only" => Self::READ_ONLY,
                "all" => Self::ALL,
                other => return Err(format!("unknown action '{}'", other)),
            };
            Ok(acc | one)
        })
    }
}

impl BitOr for Actions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Row filter applied before lookups and listing
pub type FrameFilter = Arc<dyn Fn(DataFrame) -> DataFrame + Send + Sync>;

/// Body of a list response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse {
    Paginated(PaginatedResponse),
    Plain(Value),
}

/// List result plus how many rows it carries
#[derive(Debug)]
pub struct ListOutput {
    pub body: ListResponse,
    pub rows: usize,
}

/// Result of a create
#[derive(Debug)]
pub struct Created {
    pub body: Value,
    /// Number of rows added
    pub rows: usize,
    /// Taken from a string `url` field of the representation, if any
    pub location: Option<String>,
}

/// A table exposed as a record-oriented resource
#[derive(Clone)]
pub struct DataFrameViewSet {
    name: String,
    source: Arc<dyn DataFrameSource>,
    serializer: Arc<dyn FrameSerializer>,
    pagination: Option<LimitOffsetPagination>,
    actions: Actions,
    filter: Option<FrameFilter>,
}

impl fmt::Debug for DataFrameViewSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataFrameViewSet")
            .field("name", &self.name)
            .field("serializer", &self.serializer.kind())
            .field("pagination", &self.pagination)
            .field("actions", &self.actions)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl DataFrameViewSet {
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn DataFrameSource>,
        serializer: Arc<dyn FrameSerializer>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            serializer,
            pagination: None,
            actions: Actions::ALL,
            filter: None,
        }
    }

    pub fn with_actions(mut self, actions: Actions) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_pagination(mut self, pagination: LimitOffsetPagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(DataFrame) -> DataFrame + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn actions(&self) -> Actions {
        self.actions
    }

    pub fn pagination(&self) -> Option<&LimitOffsetPagination> {
        self.pagination.as_ref()
    }

    fn check(&self, action: Action) -> DomainResult<()> {
        if self.actions.allows(action) {
            Ok(())
        } else {
            Err(DomainError::MethodNotAllowed(action.method()))
        }
    }

    /// Table with the row filter applied
    pub async fn filter_dataframe(&self) -> DomainResult<DataFrame> {
        let frame = self.source.get_dataframe().await?;
        Ok(match &self.filter {
            Some(filter) => filter(frame),
            None => frame,
        })
    }

    /// Single-row frame for `key`; unknown or malformed keys are not found
    pub async fn get_object(&self, key: &str) -> DomainResult<DataFrame> {
        let frame = self.filter_dataframe().await?;
        let label = parse_label(key).map_err(|_| DomainError::row_not_found(key))?;
        frame.loc(label).ok_or_else(|| DomainError::row_not_found(key))
    }

    pub async fn list(&self, url: &Url) -> DomainResult<ListOutput> {
        self.check(Action::List)?;
        let frame = self.filter_dataframe().await?;

        if let Some(page) = self.pagination.as_ref().and_then(|p| p.paginate(&frame, url)) {
            let rows = page.items.len();
            let results = self.serializer.to_representation(&page.items);
            return Ok(ListOutput {
                body: ListResponse::Paginated(page.into_response(results)),
                rows,
            });
        }

        Ok(ListOutput {
            rows: frame.len(),
            body: ListResponse::Plain(self.serializer.to_representation(&frame)),
        })
    }

    pub async fn retrieve(&self, key: &str) -> DomainResult<Value> {
        self.check(Action::Retrieve)?;
        let row = self.get_object(key).await?;
        Ok(self.serializer.to_representation(&row))
    }

    pub async fn create(&self, data: Value) -> DomainResult<Created> {
        self.check(Action::Create)?;
        let incoming = self.serializer.to_internal_value(data)?;
        if incoming.is_empty() {
            return Err(DomainError::Validation("no rows supplied".to_string()));
        }

        let frame = self.source.get_dataframe().await?;
        let before = frame.len();
        let merged = if self.serializer.carries_index() {
            frame.append(&incoming)?
        } else {
            frame.append_relabeled(&incoming)?
        };
        let created = merged.slice(before..merged.len());

        self.source.update_dataframe(merged).await?;
        info!(dataset = %self.name, rows = created.len(), "Rows created");

        let body = self.serializer.to_representation(&created);
        let location = body.get("url").and_then(Value::as_str).map(String::from);
        Ok(Created {
            body,
            rows: created.len(),
            location,
        })
    }

    pub async fn update(&self, key: &str, data: Value, partial: bool) -> DomainResult<Value> {
        self.check(if partial { Action::PartialUpdate } else { Action::Update })?;
        let instance = self.get_object(key).await?;
        let values = self.serializer.to_internal_value(data)?;

        if values.len() != 1 {
            return Err(DomainError::Validation(format!(
                "expected exactly one row, got {}",
                values.len()
            )));
        }
        if !partial {
            let missing: Vec<&str> = instance
                .columns()
                .iter()
                .filter(|c| !values.columns().contains(c))
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                return Err(DomainError::Validation(format!(
                    "missing columns: {}",
                    missing.join(", ")
                )));
            }
        }

        let label = instance.index()[0];
        let mut frame = self.source.get_dataframe().await?;
        frame.update_row(label, &values)?;
        let updated = self.source.update_dataframe(frame).await?;
        debug!(dataset = %self.name, label, partial, "Row updated");

        let row = updated
            .loc(label)
            .ok_or_else(|| DomainError::row_not_found(key))?;
        Ok(self.serializer.to_representation(&row))
    }

    pub async fn partial_update(&self, key: &str, data: Value) -> DomainResult<Value> {
        self.update(key, data, true).await
    }

    pub async fn destroy(&self, key: &str) -> DomainResult<()> {
        self.check(Action::Destroy)?;
        let instance = self.get_object(key).await?;
        let frame = self.source.get_dataframe().await?;
        let remaining = frame.drop(instance.index())?;
        self.source.update_dataframe(remaining).await?;
        info!(dataset = %self.name, key, "Row destroyed");
        Ok(())
    }

    /// Page-link control for the list window requested by `url`
    pub async fn page_controls(&self, url: &Url) -> DomainResult<PageControls> {
        self.check(Action::List)?;
        let not_available = || DomainError::NotFound {
            entity: "page controls",
            field: "dataset",
            value: self.name.clone(),
        };

        let pagination = self
            .pagination
            .as_ref()
            .filter(|p| p.config().page_controls)
            .ok_or_else(not_available)?;
        let frame = self.filter_dataframe().await?;
        let page = pagination.paginate(&frame, url).ok_or_else(not_available)?;
        Ok(page.window.page_controls())
    }

    pub async fn summary(&self) -> DomainResult<DatasetSummary> {
        let frame = self.filter_dataframe().await?;
        Ok(DatasetSummary {
            name: self.name.clone(),
            rows: frame.len(),
            columns: frame.columns().to_vec(),
            format: self.serializer.kind(),
            actions: self.actions.names(),
            paginated: self.pagination.is_some(),
            persistent: self.source.persists_changes(),
        })
    }
}

/// Table resources by name
#[derive(Default)]
pub struct DatasetRegistry {
    datasets: DashMap<String, Arc<DataFrameViewSet>>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `viewset`, replacing any resource with the same name
    pub fn register(&self, viewset: DataFrameViewSet) {
        let name = viewset.name().to_string();
        if self.datasets.insert(name.clone(), Arc::new(viewset)).is_some() {
            warn!(dataset = %name, "Dataset replaced");
        } else {
            info!(dataset = %name, "Dataset registered");
        }
    }

    pub fn get(&self, name: &str) -> DomainResult<Arc<DataFrameViewSet>> {
        self.datasets
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DomainError::dataset_not_found(name))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.datasets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
