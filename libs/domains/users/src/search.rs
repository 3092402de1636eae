//! Search query construction: pagination bounds, sort allow-listing, and
//! filter normalization.
//!
//! Untrusted request parameters are turned into a validated [`SearchQuery`]
//! exactly once, before anything reaches the repository. Sort keys are
//! restricted to a closed set mapped to entity columns, so a raw
//! client-supplied field name is never used as a query key.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Upper bound for the `size` request parameter.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Page size applied when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Sortable user fields. The external names form the allow-list; anything
/// else is rejected before query construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    CreatedDate,
    ModifiedDate,
}

impl SortField {
    /// The external name accepted in the `sort` request parameter
    pub fn as_property(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::CreatedDate => "createdDate",
            SortField::ModifiedDate => "modifiedDate",
        }
    }

    pub fn parse(property: &str) -> UserResult<Self> {
        match property {
            "name" => Ok(SortField::Name),
            "createdDate" => Ok(SortField::CreatedDate),
            "modifiedDate" => Ok(SortField::ModifiedDate),
            other => {
                tracing::warn!(property = other, "Rejected user search sort property");
                Err(UserError::InvalidArgument(format!(
                    "Unsupported sort property: '{}'.",
                    other
                )))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(direction: &str) -> UserResult<Self> {
        if direction.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Ascending)
        } else if direction.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Descending)
        } else {
            Err(UserError::InvalidArgument(format!(
                "Unsupported sort direction: '{}'.",
                direction
            )))
        }
    }
}

/// One sort key with its direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            direction: SortDirection::Ascending,
        }
    }
}

impl Sort {
    /// Parse a `<field>` or `<field>,<asc|desc>` spec
    pub fn parse(spec: &str) -> UserResult<Self> {
        let mut parts = spec.splitn(2, ',');
        let field = SortField::parse(parts.next().unwrap_or_default().trim())?;
        let direction = match parts.next() {
            Some(direction) => SortDirection::parse(direction.trim())?,
            None => SortDirection::Ascending,
        };
        Ok(Self { field, direction })
    }

    /// Parse several sort specs, validating each independently in request
    /// order. The first invalid spec determines the error.
    pub fn parse_all<'a>(specs: impl IntoIterator<Item = &'a str>) -> UserResult<Vec<Self>> {
        specs.into_iter().map(Self::parse).collect()
    }
}

/// Normalized optional filters over persisted users.
///
/// Inputs are trimmed once at construction; both repository backends
/// compare against the stored values with identical semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilters {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

impl UserFilters {
    pub fn new(name: Option<String>, email: Option<String>, phone: Option<String>) -> Self {
        Self {
            name: name.map(|v| v.trim().to_owned()),
            email: email.map(|v| v.trim().to_owned()),
            phone: phone.map(|v| v.trim().to_owned()),
        }
    }

    /// Case-insensitive substring filter on the user name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Exact, case-sensitive filter on the user email
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Exact, case-sensitive filter on the user phone
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Conjunction of all present filters. Absent filters never narrow
    /// the result set.
    pub fn matches(&self, user: &User) -> bool {
        if let Some(ref name) = self.name {
            if !user.name.to_uppercase().contains(&name.to_uppercase()) {
                return false;
            }
        }
        if let Some(ref email) = self.email {
            if user.email != *email {
                return false;
            }
        }
        if let Some(ref phone) = self.phone {
            if user.phone != *phone {
                return false;
            }
        }
        true
    }
}

/// Raw search parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct SearchParams {
    /// Zero-based page index (default 0)
    pub page: Option<i64>,
    /// Page size, at most 100 (default 100)
    pub size: Option<i64>,
    /// Sort spec: `<field>` or `<field>,<asc|desc>`; allowed fields are
    /// `name`, `createdDate`, `modifiedDate` (default `name,asc`)
    pub sort: Option<String>,
    /// Case-insensitive substring match on the name
    pub name: Option<String>,
    /// Exact match on the email
    pub email: Option<String>,
    /// Exact match on the phone
    pub phone: Option<String>,
}

/// A fully validated search request. Construction is the only place where
/// untrusted pagination and sort input is checked; instances are immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    page: u64,
    size: u64,
    sorts: Vec<Sort>,
    filters: UserFilters,
}

impl SearchQuery {
    /// Validate and build a query from typed parts. An empty sort list
    /// falls back to the default `name` ascending.
    pub fn new(page: i64, size: i64, sorts: Vec<Sort>, filters: UserFilters) -> UserResult<Self> {
        validate_pagination(page, size)?;
        let sorts = if sorts.is_empty() {
            vec![Sort::default()]
        } else {
            sorts
        };
        Ok(Self {
            page: page as u64,
            size: size as u64,
            sorts,
            filters,
        })
    }

    /// Validate and build a query from raw request parameters. Sort specs
    /// are checked first, then pagination bounds; each failure
    /// short-circuits with `InvalidArgument`.
    pub fn parse(params: SearchParams) -> UserResult<Self> {
        let sorts = match params.sort.as_deref() {
            Some(spec) => Sort::parse_all([spec])?,
            None => Vec::new(),
        };
        Self::new(
            params.page.unwrap_or(0),
            params.size.unwrap_or(DEFAULT_PAGE_SIZE as i64),
            sorts,
            UserFilters::new(params.name, params.email, params.phone),
        )
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    pub fn filters(&self) -> &UserFilters {
        &self.filters
    }

    /// Number of records to skip for the requested page
    pub fn offset(&self) -> u64 {
        self.page * self.size
    }
}

fn validate_pagination(page: i64, size: i64) -> UserResult<()> {
    if page < 0 {
        return Err(UserError::InvalidArgument(
            "Invalid page number param.".to_owned(),
        ));
    }
    if size < 0 || size > MAX_PAGE_SIZE as i64 {
        return Err(UserError::InvalidArgument(format!(
            "Invalid page size param. Max page size: {}.",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// One page of results plus the metadata needed to walk the full set
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    /// Zero-based index of this page
    pub number: u64,
    /// Requested page size (not the number of returned rows)
    pub size: u64,
    /// Total count of records matching the filters
    pub total_elements: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, number: u64, size: u64, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            1
        } else {
            total_elements.div_ceil(size)
        };
        let has_next = number + 1 < total_pages;
        Self {
            content,
            number,
            size,
            total_elements,
            total_pages,
            has_next,
        }
    }
}
