//! Consensus aggregation
//!
//! Turns the fan-out's raw response list into a [`ConsensusResult`]:
//! pairwise similarity matrix over the usable answers, mean agreement
//! score, verdict classification, representative selection, and dissenter
//! identification. Aggregation never fails — zero usable answers still
//! produce a well-formed no-consensus result, and the raw responses are
//! carried through unchanged for per-model error inspection.

use super::response::ModelResponse;
use super::result::{ConsensusResult, Dissenter};
use super::verdict::Verdict;
use crate::similarity::sim;

/// Aggregate the fan-out responses into a verdict.
///
/// Successful responses with an empty answer are coerced to failures
/// before scoring, so the `success ⇒ non-empty answer` invariant holds on
/// the returned list.
///
/// Selection tie-breaks are by first index among the usable responses,
/// which is stable with respect to the fan-out's dispatch order.
pub fn aggregate(responses: Vec<ModelResponse>) -> ConsensusResult {
    let responses: Vec<ModelResponse> = responses.into_iter().map(coerce_empty).collect();

    let usable: Vec<&ModelResponse> = responses.iter().filter(|r| r.has_answer()).collect();

    match usable.len() {
        0 => ConsensusResult::new(Verdict::NoConsensus, 0.0, responses, None, None),
        1 => {
            let representative = usable[0].answer.clone();
            ConsensusResult::new(
                Verdict::NoConsensus,
                0.0,
                responses,
                Some(representative),
                None,
            )
        }
        n => {
            let matrix = similarity_matrix(&usable);

            let mut pair_sum = 0.0;
            let mut pair_count = 0u32;
            for i in 0..n {
                for j in (i + 1)..n {
                    pair_sum += matrix[i][j];
                    pair_count += 1;
                }
            }
            let score = round_two(pair_sum / pair_count as f64);
            let verdict = Verdict::from_score(score);

            let representative_idx = select_by_mean(&matrix, Extreme::Max);
            let representative = usable[representative_idx].answer.clone();

            let dissenter = if verdict.is_split() {
                let idx = select_by_mean(&matrix, Extreme::Min);
                Some(Dissenter {
                    model: usable[idx].model.clone(),
                    answer: usable[idx].answer.clone(),
                })
            } else {
                None
            };

            ConsensusResult::new(verdict, score, responses, Some(representative), dissenter)
        }
    }
}

fn coerce_empty(mut response: ModelResponse) -> ModelResponse {
    if response.success && response.answer.is_empty() {
        response.success = false;
        response
            .error
            .get_or_insert_with(|| "model returned an empty answer".to_string());
    }
    response
}

/// Symmetric pairwise similarity matrix with a unit diagonal.
fn similarity_matrix(usable: &[&ModelResponse]) -> Vec<Vec<f64>> {
    let n = usable.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    for i in 0..n {
        for j in (i + 1)..n {
            let s = sim(&usable[i].answer, &usable[j].answer);
            matrix[i][j] = s;
            matrix[j][i] = s;
        }
    }
    matrix
}

enum Extreme {
    Max,
    Min,
}

/// Index of the element whose mean similarity to the others is extremal.
///
/// Ties resolve to the first index: a later candidate wins only by a
/// strict comparison.
fn select_by_mean(matrix: &[Vec<f64>], extreme: Extreme) -> usize {
    let n = matrix.len();
    let mut best_idx = 0;
    let mut best_mean = mean_to_others(matrix, 0);
    for i in 1..n {
        let mean = mean_to_others(matrix, i);
        let better = match extreme {
            Extreme::Max => mean > best_mean,
            Extreme::Min => mean < best_mean,
        };
        if better {
            best_idx = i;
            best_mean = mean;
        }
    }
    best_idx
}

fn mean_to_others(matrix: &[Vec<f64>], i: usize) -> f64 {
    let n = matrix.len();
    if n < 2 {
        return 0.0;
    }
    let sum: f64 = (0..n).filter(|&j| j != i).map(|j| matrix[i][j]).sum();
    sum / (n - 1) as f64
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
