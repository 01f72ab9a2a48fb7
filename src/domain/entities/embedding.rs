use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Fingerprint, Identifier};

/// Vector for one node's designated embedding text. Never mutated; a newer row supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    id: Identifier,
    node_id: Identifier,
    model_name: String,
    created_at: DateTime<Utc>,
    embedding_vector: Vector,
}

impl Embedding {
    /// The identifier is derived from node, model and source text, so embedding the same text
    /// with the same model twice yields the same row.
    pub fn new(node_id: Identifier, model_name: String, source_text: &str, vector: Vector) -> Self {
        let fingerprint = Fingerprint::from_parts(&[&model_name, source_text]);
        Self {
            id: Identifier::for_embedding(&node_id, fingerprint.as_str()),
            node_id,
            model_name,
            created_at: Utc::now(),
            embedding_vector: vector,
        }
    }

    pub fn restore(
        id: Identifier,
        node_id: Identifier,
        model_name: String,
        created_at: DateTime<Utc>,
        embedding_vector: Vector,
    ) -> Self {
        Self {
            id,
            node_id,
            model_name,
            created_at,
            embedding_vector,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn node_id(&self) -> &Identifier {
        &self.node_id
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn embedding_vector(&self) -> &Vector {
        &self.embedding_vector
    }

    pub fn dimension(&self) -> usize {
        self.embedding_vector.as_slice().len()
    }

    pub fn is_compatible_with(&self, other: &Embedding) -> bool {
        self.model_name == other.model_name && self.dimension() == other.dimension()
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> Result<f32, String> {
        if !self.is_compatible_with(other) {
            return Err("Embeddings are not compatible for similarity calculation".to_string());
        }

        cosine_similarity(self.embedding_vector.as_slice(), other.embedding_vector.as_slice())
            .ok_or_else(|| "Cannot calculate similarity with zero vector".to_string())
    }

    pub fn supersedes(&self, other: &Embedding) -> bool {
        self.node_id == other.node_id && self.created_at > other.created_at
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    Some(dot_product / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_id() -> Identifier {
        Identifier::parse("node_001_0004").unwrap()
    }

    #[test]
    fn test_embedding_creation() {
        let embedding = Embedding::new(
            node_id(),
            "test-model".to_string(),
            "Intro text",
            Vector::from(vec![0.1, 0.2, 0.3]),
        );

        assert_eq!(embedding.node_id(), &node_id());
        assert_eq!(embedding.model_name(), "test-model");
        assert_eq!(embedding.dimension(), 3);
        assert!(embedding.id().to_string().starts_with("emb_001_0004_"));
    }

    #[test]
    fn test_identifier_depends_on_model_and_text() {
        let vector = Vector::from(vec![1.0, 0.0]);
        let a = Embedding::new(node_id(), "m1".to_string(), "text", vector.clone());
        let b = Embedding::new(node_id(), "m1".to_string(), "text", vector.clone());
        let c = Embedding::new(node_id(), "m2".to_string(), "text", vector.clone());
        let d = Embedding::new(node_id(), "m1".to_string(), "edited text", vector);

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_ne!(a.id(), d.id());
    }

    #[test]
    fn test_cosine_similarity() {
        let a = Embedding::new(node_id(), "m".to_string(), "a", Vector::from(vec![1.0, 0.0, 0.0]));
        let b = Embedding::new(node_id(), "m".to_string(), "b", Vector::from(vec![1.0, 0.0, 0.0]));
        let c = Embedding::new(node_id(), "m".to_string(), "c", Vector::from(vec![0.0, 0.0, 0.0]));

        let similarity = a.cosine_similarity(&b).unwrap();
        assert!((similarity - 1.0).abs() < 1e-6);
        assert!(a.cosine_similarity(&c).is_err());
    }

    #[test]
    fn test_incompatible_models() {
        let a = Embedding::new(node_id(), "m1".to_string(), "a", Vector::from(vec![1.0, 0.0]));
        let b = Embedding::new(node_id(), "m2".to_string(), "a", Vector::from(vec![1.0, 0.0]));
        assert!(!a.is_compatible_with(&b));
        assert!(a.cosine_similarity(&b).is_err());
    }
}
