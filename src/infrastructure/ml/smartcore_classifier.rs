use crate::application::ml::Classifier;
use crate::domain::errors::InferenceError;
use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

/// Class 1: next close higher than this close.
const UP_LABEL: i32 = 1;
const DOWN_LABEL: i32 = 0;

type Forest = RandomForestClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;
type Logit = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestParams {
    pub n_trees: u16,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 20,
            min_samples_split: 5,
            seed: 42,
        }
    }
}

/// Binary up/down classifier backed by smartcore, persisted with serde.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartCoreClassifier {
    RandomForest(Forest),
    LogisticRegression(Logit),
    /// Hard majority vote over the members; a tie is DOWN.
    Ensemble(Vec<SmartCoreClassifier>),
}

impl SmartCoreClassifier {
    pub fn fit_random_forest(x: &[Vec<f64>], up: &[bool], params: ForestParams) -> Result<Self> {
        let (matrix, y) = training_data(x, up)?;
        let parameters = RandomForestClassifierParameters::default()
            .with_n_trees(params.n_trees)
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split)
            .with_seed(params.seed);
        let model = RandomForestClassifier::fit(&matrix, &y, parameters)
            .map_err(|e| anyhow!("Random forest training failed: {}", e))?;
        Ok(Self::RandomForest(model))
    }

    pub fn fit_logistic_regression(x: &[Vec<f64>], up: &[bool]) -> Result<Self> {
        let (matrix, y) = training_data(x, up)?;
        let model = LogisticRegression::fit(&matrix, &y, LogisticRegressionParameters::default())
            .map_err(|e| anyhow!("Logistic regression training failed: {}", e))?;
        Ok(Self::LogisticRegression(model))
    }

    /// Random forest and logistic regression fitted on the same rows, voting together.
    pub fn fit_ensemble(x: &[Vec<f64>], up: &[bool], params: ForestParams) -> Result<Self> {
        Self::ensemble(vec![
            Self::fit_random_forest(x, up, params)?,
            Self::fit_logistic_regression(x, up)?,
        ])
    }

    pub fn ensemble(members: Vec<SmartCoreClassifier>) -> Result<Self> {
        if members.is_empty() {
            bail!("An ensemble needs at least one member");
        }
        Ok(Self::Ensemble(members))
    }

    /// Up/down predictions for a batch of (already scaled) rows
    pub fn predict_batch(&self, x: &[Vec<f64>]) -> Result<Vec<bool>, InferenceError> {
        let labels = match self {
            Self::RandomForest(model) => model.predict(&self.matrix(x)?),
            Self::LogisticRegression(model) => model.predict(&self.matrix(x)?),
            Self::Ensemble(members) => return self.vote(members, x),
        }
        .map_err(|e| self.failure(e))?;
        Ok(labels.into_iter().map(|label| label == UP_LABEL).collect())
    }

    fn vote(&self, members: &[SmartCoreClassifier], x: &[Vec<f64>]) -> Result<Vec<bool>, InferenceError> {
        let mut up_votes = vec![0_usize; x.len()];
        for member in members {
            for (count, up) in up_votes.iter_mut().zip(member.predict_batch(x)?) {
                *count += usize::from(up);
            }
        }
        Ok(up_votes
            .into_iter()
            .map(|count| count * 2 > members.len())
            .collect())
    }

    fn matrix(&self, x: &[Vec<f64>]) -> Result<DenseMatrix<f64>, InferenceError> {
        DenseMatrix::from_2d_vec(&x.to_vec()).map_err(|e| self.failure(e))
    }

    fn failure(&self, e: impl std::fmt::Display) -> InferenceError {
        InferenceError::Model {
            name: self.name().to_string(),
            reason: e.to_string(),
        }
    }
}

fn training_data(x: &[Vec<f64>], up: &[bool]) -> Result<(DenseMatrix<f64>, Vec<i32>)> {
    if x.is_empty() {
        bail!("No training rows");
    }
    if x.len() != up.len() {
        bail!("{} feature rows but {} labels", x.len(), up.len());
    }
    let matrix = DenseMatrix::from_2d_vec(&x.to_vec()).map_err(|e| anyhow!("Matrix error: {}", e))?;
    let labels = up
        .iter()
        .map(|&u| if u { UP_LABEL } else { DOWN_LABEL })
        .collect();
    Ok((matrix, labels))
}

impl Classifier for SmartCoreClassifier {
    fn predict_up(&self, features: &[f64]) -> Result<bool, InferenceError> {
        self.predict_batch(&[features.to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| self.failure("no prediction returned"))
    }

    fn name(&self) -> &str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::LogisticRegression(_) => "logistic_regression",
            Self::Ensemble(_) => "ensemble",
        }
    }
}
