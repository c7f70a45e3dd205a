//! Canonical ordering and id assignment

use crate::ids::{IdGenerator, RandomIds, SYNTHETIC_ID_RANGE};
use crate::ir::{Concept, IrNode, Message, Named};
use tracing::debug;

/// Concept ids starting with this prefix are kept as written
pub const CONCEPT_ID_PREFIX: char = 'c';

/// Synthetic ids are this prefix followed by the generated number
pub const SYNTHETIC_ID_PREFIX: &str = "concept_";

/// Rewrites IR into canonical form.
///
/// Every children list is stably sorted into concepts, relations, quantifiers and then
/// references. Concepts whose id does not start with `c` get a synthetic `concept_<n>` id from
/// the generator. The input is never modified.
#[derive(Debug, Default)]
pub struct Normalizer<G = RandomIds> {
    ids: G,
}

impl<G: IdGenerator> Normalizer<G> {
    pub fn new(ids: G) -> Self {
        Self { ids }
    }

    /// Consumes the normalizer, returning its id generator
    pub fn into_inner(self) -> G {
        self.ids
    }

    /// Builds the normalized copy of a node
    pub fn normalize(&mut self, node: &IrNode) -> IrNode {
        match node {
            IrNode::Message(message) => IrNode::Message(self.normalize_message(message)),
            IrNode::Concept(concept) => IrNode::Concept(self.normalize_concept(concept)),
            IrNode::Relation(named) => IrNode::Relation(self.normalize_named(named)),
            IrNode::Quantifier(named) => IrNode::Quantifier(self.normalize_named(named)),
            IrNode::Reference(reference) => IrNode::Reference(reference.clone()),
        }
    }

    /// Builds the normalized copy of a message
    pub fn normalize_message(&mut self, message: &Message) -> Message {
        Message::new(
            message.version.clone(),
            self.normalize_children(&message.children),
        )
    }

    fn normalize_concept(&mut self, concept: &Concept) -> Concept {
        let id = if concept.id.starts_with(CONCEPT_ID_PREFIX) {
            concept.id.clone()
        } else {
            let number = self.ids.next_id(concept) % SYNTHETIC_ID_RANGE;
            let synthetic = format!("{SYNTHETIC_ID_PREFIX}{number}");
            debug!("replaced concept id {:?} with {synthetic:?}", concept.id);
            synthetic
        };
        Concept::new(
            id,
            concept.qualifier.clone(),
            self.normalize_children(&concept.children),
        )
    }

    fn normalize_named(&mut self, named: &Named) -> Named {
        Named::new(named.name.clone(), self.normalize_children(&named.children))
    }

    fn normalize_children(&mut self, children: &[IrNode]) -> Vec<IrNode> {
        let mut normalized = children
            .iter()
            .map(|child| self.normalize(child))
            .collect::<Vec<_>>();
        normalized.sort_by_key(IrNode::precedence);
        normalized
    }
}

/// Normalizes with randomly drawn synthetic ids
pub fn normalize(node: &IrNode) -> IrNode {
    Normalizer::new(RandomIds::new()).normalize(node)
}

/// Checks whether an id looks like one the normalizer generated
pub fn is_synthetic_id(id: &str) -> bool {
    id.strip_prefix(SYNTHETIC_ID_PREFIX)
        .and_then(|number| number.parse::<u32>().ok())
        .is_some_and(|number| number < SYNTHETIC_ID_RANGE)
}
