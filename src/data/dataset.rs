//! data::dataset — validated discrete-choice observations.
//!
//! Purpose
//! -------
//! Hold one discrete-choice data set: which item each observation chose,
//! which user made the choice and in which session, which items were
//! available, and the named feature tables the utility specification reads.
//!
//! Key behaviors
//! -------------
//! - [`ChoiceDatasetBuilder::build`] validates every index and feature
//!   against the inferred table sizes before a [`ChoiceDataset`] exists.
//! - [`ChoiceDataset::subset`] slices observations only; feature tables and
//!   availability are shared through `Arc`, so mini-batches are cheap.
//! - [`ChoiceDataset::feature_x`] / [`ChoiceDataset::x_dict`] expand any
//!   feature to an observation-level tensor `(len, num_items, k)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `item_index`, `session_index` and (when present) `user_index` have one
//!   entry per observation and are in range for their tables.
//! - When no session index is supplied every observation is its own session
//!   (`session_index = 0..len`).
//! - When availability is supplied, every chosen item is available.
//! - Feature values are finite. Non-finite `price_` cells of unavailable
//!   (session, item) pairs, such as the `NaN` gaps `pivot3d` leaves for
//!   unbalanced choice sets, are stored as `0.0`; their utility is masked to
//!   `-∞` by the models.
//!
//! Conventions
//! -----------
//! - All indices are 0-based.
//! - `num_items` is taken from the builder, then from item-carrying features,
//!   then from `max(item_index) + 1`; users and sessions follow the same rule.
//!
//! Testing notes
//! -------------
//! - Unit tests cover size inference, each validation failure, expansion of
//!   every feature kind, and subsetting.
use crate::data::{
    errors::{DataError, DataResult},
    features::{Feature, FeatureKind, FeatureTensor},
};
use ndarray::{Array1, Array2, Array3, Axis};
use std::{collections::BTreeMap, fmt, sync::Arc};

/// Discrete-choice observations plus shared feature tables.
#[derive(Debug, Clone)]
pub struct ChoiceDataset {
    item_index: Array1<usize>,
    user_index: Option<Array1<usize>>,
    session_index: Array1<usize>,
    num_items: usize,
    num_users: Option<usize>,
    num_sessions: usize,
    item_availability: Option<Arc<Array2<bool>>>,
    features: Arc<BTreeMap<String, Feature>>,
}

impl ChoiceDataset {
    /// Start building a dataset from the chosen item of each observation.
    pub fn builder(item_index: Array1<usize>) -> ChoiceDatasetBuilder {
        ChoiceDatasetBuilder::new(item_index)
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.item_index.len()
    }

    /// `true` if there are no observations (never the case for built datasets).
    pub fn is_empty(&self) -> bool {
        self.item_index.is_empty()
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn num_users(&self) -> Option<usize> {
        self.num_users
    }

    pub fn num_sessions(&self) -> usize {
        self.num_sessions
    }

    /// Chosen item per observation.
    pub fn labels(&self) -> &Array1<usize> {
        &self.item_index
    }

    pub fn user_index(&self) -> Option<&Array1<usize>> {
        self.user_index.as_ref()
    }

    pub fn session_index(&self) -> &Array1<usize> {
        &self.session_index
    }

    /// Feature names in storage order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Look up a raw feature.
    pub fn feature(&self, name: &str) -> DataResult<&Feature> {
        self.features.get(name).ok_or_else(|| DataError::MissingFeature { name: name.to_string() })
    }

    /// Restrict the dataset to the observations at `indices`.
    ///
    /// Indices may repeat and appear in any order. Feature tables and the
    /// availability matrix are shared with `self`.
    ///
    /// # Errors
    /// - [`DataError::EmptySubset`] for an empty index list.
    /// - [`DataError::IndexOutOfRange`] if an index is `>= self.len()`.
    pub fn subset(&self, indices: &[usize]) -> DataResult<Self> {
        if indices.is_empty() {
            return Err(DataError::EmptySubset);
        }
        let n = self.len();
        if let Some((position, &value)) = indices.iter().enumerate().find(|(_, &i)| i >= n) {
            return Err(DataError::IndexOutOfRange { name: "subset", position, value, bound: n });
        }
        Ok(Self {
            item_index: self.item_index.select(Axis(0), indices),
            user_index: self.user_index.as_ref().map(|u| u.select(Axis(0), indices)),
            session_index: self.session_index.select(Axis(0), indices),
            num_items: self.num_items,
            num_users: self.num_users,
            num_sessions: self.num_sessions,
            item_availability: self.item_availability.clone(),
            features: Arc::clone(&self.features),
        })
    }

    /// Expand one feature to shape `(len, num_items, k)`.
    ///
    /// - item: the same table for every observation;
    /// - user / session: the observation's row, repeated for every item;
    /// - price: the observation's session slice;
    /// - useritem: the observation's user slice.
    ///
    /// # Errors
    /// - [`DataError::MissingFeature`] if `name` is unknown.
    /// - [`DataError::MissingUserIndex`] for user-level features without a
    ///   user index (prevented by the builder).
    pub fn feature_x(&self, name: &str) -> DataResult<Array3<f64>> {
        let feature = self.feature(name)?;
        let k = feature.tensor.num_params();
        let mut out = Array3::<f64>::zeros((self.len(), self.num_items, k));
        match (&feature.tensor, feature.kind) {
            (FeatureTensor::Flat(table), FeatureKind::Item) => {
                for mut obs in out.outer_iter_mut() {
                    obs.assign(table);
                }
            }
            (FeatureTensor::Flat(table), FeatureKind::Session) => {
                for (mut obs, &s) in out.outer_iter_mut().zip(self.session_index.iter()) {
                    obs.assign(&table.row(s));
                }
            }
            (FeatureTensor::Flat(table), FeatureKind::User) => {
                let users = self.require_users(name)?;
                for (mut obs, &u) in out.outer_iter_mut().zip(users.iter()) {
                    obs.assign(&table.row(u));
                }
            }
            (FeatureTensor::Grid(grid), FeatureKind::Price) => {
                for (mut obs, &s) in out.outer_iter_mut().zip(self.session_index.iter()) {
                    obs.assign(&grid.index_axis(Axis(0), s));
                }
            }
            (FeatureTensor::Grid(grid), FeatureKind::UserItem) => {
                let users = self.require_users(name)?;
                for (mut obs, &u) in out.outer_iter_mut().zip(users.iter()) {
                    obs.assign(&grid.index_axis(Axis(0), u));
                }
            }
            _ => {
                return Err(DataError::FeatureLayout {
                    name: name.to_string(),
                    reason: "feature layout does not match its prefix",
                });
            }
        }
        Ok(out)
    }

    /// Expand every feature; see [`ChoiceDataset::feature_x`].
    pub fn x_dict(&self) -> DataResult<BTreeMap<String, Array3<f64>>> {
        self.features.keys().map(|name| Ok((name.clone(), self.feature_x(name)?))).collect()
    }

    /// Per-observation availability `(len, num_items)`, if any was supplied.
    pub fn availability(&self) -> Option<Array2<bool>> {
        let sessions = self.session_index.to_vec();
        self.item_availability.as_ref().map(|avail| avail.select(Axis(0), &sessions))
    }

    fn require_users(&self, name: &str) -> DataResult<&Array1<usize>> {
        self.user_index.as_ref().ok_or_else(|| DataError::MissingUserIndex { name: name.to_string() })
    }
}

impl fmt::Display for ChoiceDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.len();
        write!(f, "ChoiceDataset(label=[{n}], item_index=[{n}]")?;
        match &self.user_index {
            Some(u) => write!(f, ", user_index=[{}]", u.len())?,
            None => write!(f, ", user_index=[]")?,
        }
        write!(f, ", session_index=[{}]", self.session_index.len())?;
        match &self.item_availability {
            Some(a) => write!(f, ", item_availability=[{}, {}]", a.nrows(), a.ncols())?,
            None => write!(f, ", item_availability=[]")?,
        }
        for (name, feature) in self.features.iter() {
            let dims: Vec<String> = feature.tensor.shape().iter().map(usize::to_string).collect();
            write!(f, ", {name}=[{}]", dims.join(", "))?;
        }
        write!(f, ")")
    }
}

/// Builder for [`ChoiceDataset`]; see the module docs for the inference rules.
#[derive(Debug, Clone)]
pub struct ChoiceDatasetBuilder {
    item_index: Array1<usize>,
    num_items: Option<usize>,
    user_index: Option<Array1<usize>>,
    num_users: Option<usize>,
    session_index: Option<Array1<usize>>,
    num_sessions: Option<usize>,
    item_availability: Option<Array2<bool>>,
    features: Vec<(String, FeatureTensor)>,
}

impl ChoiceDatasetBuilder {
    pub fn new(item_index: Array1<usize>) -> Self {
        Self {
            item_index,
            num_items: None,
            user_index: None,
            num_users: None,
            session_index: None,
            num_sessions: None,
            item_availability: None,
            features: Vec::new(),
        }
    }

    pub fn num_items(mut self, num_items: usize) -> Self {
        self.num_items = Some(num_items);
        self
    }

    pub fn user_index(mut self, user_index: Array1<usize>) -> Self {
        self.user_index = Some(user_index);
        self
    }

    pub fn num_users(mut self, num_users: usize) -> Self {
        self.num_users = Some(num_users);
        self
    }

    pub fn session_index(mut self, session_index: Array1<usize>) -> Self {
        self.session_index = Some(session_index);
        self
    }

    pub fn num_sessions(mut self, num_sessions: usize) -> Self {
        self.num_sessions = Some(num_sessions);
        self
    }

    /// Availability matrix of shape `(num_sessions, num_items)`.
    pub fn item_availability(mut self, availability: Array2<bool>) -> Self {
        self.item_availability = Some(availability);
        self
    }

    /// Register a named feature; the prefix decides its kind.
    pub fn feature(mut self, name: impl Into<String>, tensor: impl Into<FeatureTensor>) -> Self {
        self.features.push((name.into(), tensor.into()));
        self
    }

    /// Validate and assemble the dataset.
    ///
    /// # Errors
    /// Returns the first failing check, in this order: empty data, index
    /// lengths, feature validity, item/user/session sizes and index ranges,
    /// availability shape, chosen-item availability.
    pub fn build(self) -> DataResult<ChoiceDataset> {
        let n = self.item_index.len();
        if n == 0 {
            return Err(DataError::EmptyDataset);
        }
        check_length("user_index", self.user_index.as_ref(), n)?;
        check_length("session_index", self.session_index.as_ref(), n)?;

        let mut features = BTreeMap::new();
        for (name, tensor) in self.features {
            let tensor = match (&self.item_availability, FeatureKind::from_name(&name)) {
                (Some(avail), Ok(FeatureKind::Price)) => zero_unavailable(tensor, avail),
                _ => tensor,
            };
            let feature = Feature::new(&name, tensor)?;
            if feature.kind.needs_user_index() && self.user_index.is_none() {
                return Err(DataError::MissingUserIndex { name });
            }
            if features.contains_key(&name) {
                return Err(DataError::DuplicateFeature { name });
            }
            features.insert(name, feature);
        }

        let item_dims: Vec<(&str, usize)> = features
            .iter()
            .filter_map(|(name, f)| f.item_dim().map(|d| (name.as_str(), d)))
            .collect();
        let num_items = resolve_dim("item", self.num_items, &item_dims, &self.item_index)?;
        check_range("item_index", &self.item_index, num_items)?;

        let user_dims: Vec<(&str, usize)> = features
            .iter()
            .filter(|(_, f)| f.kind.needs_user_index())
            .map(|(name, f)| (name.as_str(), f.tensor.rows()))
            .collect();
        let num_users = match &self.user_index {
            Some(users) => {
                let num_users = resolve_dim("user", self.num_users, &user_dims, users)?;
                check_range("user_index", users, num_users)?;
                Some(num_users)
            }
            None => self.num_users,
        };

        let session_index = self.session_index.unwrap_or_else(|| Array1::from_iter(0..n));
        let mut session_dims: Vec<(&str, usize)> = features
            .iter()
            .filter(|(_, f)| matches!(f.kind, FeatureKind::Session | FeatureKind::Price))
            .map(|(name, f)| (name.as_str(), f.tensor.rows()))
            .collect();
        if let Some(avail) = &self.item_availability {
            session_dims.push(("item_availability", avail.nrows()));
        }
        let num_sessions = resolve_dim("session", self.num_sessions, &session_dims, &session_index)?;
        check_range("session_index", &session_index, num_sessions)?;

        if let Some(avail) = &self.item_availability {
            let expected = (num_sessions, num_items);
            let found = (avail.nrows(), avail.ncols());
            if expected != found {
                return Err(DataError::AvailabilityShapeMismatch { expected, found });
            }
            for (observation, (&item, &session)) in
                self.item_index.iter().zip(session_index.iter()).enumerate()
            {
                if !avail[[session, item]] {
                    return Err(DataError::ChosenItemUnavailable { observation, item });
                }
            }
        }

        Ok(ChoiceDataset {
            item_index: self.item_index,
            user_index: self.user_index,
            session_index,
            num_items,
            num_users,
            num_sessions,
            item_availability: self.item_availability.map(Arc::new),
            features: Arc::new(features),
        })
    }
}

// ---- Helper methods ----

/// Replace non-finite cells of unavailable `(session, item)` pairs by `0.0`.
///
/// Tensors whose leading dimensions disagree with `avail` are returned
/// untouched; the shape checks in `build` report them.
fn zero_unavailable(tensor: FeatureTensor, avail: &Array2<bool>) -> FeatureTensor {
    match tensor {
        FeatureTensor::Grid(mut t)
            if t.len_of(Axis(0)) == avail.nrows() && t.len_of(Axis(1)) == avail.ncols() =>
        {
            for ((session, item, _), v) in t.indexed_iter_mut() {
                if !avail[[session, item]] && !v.is_finite() {
                    *v = 0.0;
                }
            }
            FeatureTensor::Grid(t)
        }
        other => other,
    }
}

fn check_length(name: &'static str, index: Option<&Array1<usize>>, n: usize) -> DataResult<()> {
    match index {
        Some(idx) if idx.len() != n => {
            Err(DataError::IndexLengthMismatch { name, expected: n, found: idx.len() })
        }
        _ => Ok(()),
    }
}

fn check_range(name: &'static str, index: &Array1<usize>, bound: usize) -> DataResult<()> {
    match index.iter().enumerate().find(|(_, &v)| v >= bound) {
        Some((position, &value)) => Err(DataError::IndexOutOfRange { name, position, value, bound }),
        None => Ok(()),
    }
}

/// Table size: explicit value, else the first feature dimension, else
/// `max(index) + 1`. Every feature must then agree with it.
fn resolve_dim(
    dim: &'static str, explicit: Option<usize>, feature_dims: &[(&str, usize)],
    index: &Array1<usize>,
) -> DataResult<usize> {
    let inferred = index.iter().max().map_or(0, |m| m + 1);
    let size = explicit.or_else(|| feature_dims.first().map(|(_, d)| *d)).unwrap_or(inferred);
    for (name, found) in feature_dims {
        if *found != size {
            return Err(DataError::FeatureShapeMismatch {
                name: name.to_string(),
                dim,
                expected: size,
                found: *found,
            });
        }
    }
    Ok(size)
}
