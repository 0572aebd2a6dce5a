//! Logical pieces, each with a stable id, kept in step with the rules
//! oracle by the move engine.

use std::collections::BTreeMap;

use serde::Serialize;

use chess_core::{PieceKind, RulesOracle, Side, Square};

use crate::error::MoveError;

pub type PieceId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieceEntity {
    pub id: PieceId,
    pub side: Side,
    pub kind: PieceKind,
    pub square: Square,
}

#[derive(Debug, Clone, Default)]
pub struct PieceRegistry {
    pieces: BTreeMap<PieceId, PieceEntity>,
    next_id: PieceId,
}

impl PieceRegistry {
    /// One entity per occupied square of `rules`' position.
    pub fn from_oracle(rules: &dyn RulesOracle) -> Self {
        let mut registry = Self::default();
        for index in 0..64 {
            if let Some(square) = Square::from_index(index) {
                if let Some((side, kind)) = rules.piece_at(square) {
                    registry.add(side, kind, square);
                }
            }
        }
        registry
    }

    fn add(&mut self, side: Side, kind: PieceKind, square: Square) -> PieceEntity {
        self.next_id += 1;
        let entity = PieceEntity {
            id: self.next_id,
            side,
            kind,
            square,
        };
        self.pieces.insert(entity.id, entity.clone());
        entity
    }

    pub fn get(&self, id: PieceId) -> Option<&PieceEntity> {
        self.pieces.get(&id)
    }

    pub fn at(&self, square: Square) -> Option<&PieceEntity> {
        self.pieces.values().find(|p| p.square == square)
    }

    pub fn all(&self) -> impl Iterator<Item = &PieceEntity> {
        self.pieces.values()
    }

    pub fn count(&self, side: Side) -> usize {
        self.pieces.values().filter(|p| p.side == side).count()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    fn id_at(&self, square: Square) -> Result<PieceId, MoveError> {
        self.at(square)
            .map(|p| p.id)
            .ok_or_else(|| MoveError::Registry(format!("no piece on {square}")))
    }

    pub fn move_piece(&mut self, from: Square, to: Square) -> Result<PieceId, MoveError> {
        if self.at(to).is_some() {
            return Err(MoveError::Registry(format!("{to} is occupied")));
        }
        let id = self.id_at(from)?;
        if let Some(piece) = self.pieces.get_mut(&id) {
            piece.square = to;
        }
        Ok(id)
    }

    pub fn remove_at(&mut self, square: Square) -> Result<PieceEntity, MoveError> {
        let id = self.id_at(square)?;
        self.pieces
            .remove(&id)
            .ok_or_else(|| MoveError::Registry(format!("piece {id} vanished")))
    }

    /// Replace the pawn on `square` with a fresh entity of `kind`.
    pub fn promote(&mut self, square: Square, kind: PieceKind) -> Result<(PieceId, PieceEntity), MoveError> {
        let current = self
            .at(square)
            .map(|p| p.kind)
            .ok_or_else(|| MoveError::Registry(format!("no piece on {square}")))?;
        if current != PieceKind::Pawn {
            return Err(MoveError::Registry(format!("{square} holds a {current}, not a pawn")));
        }
        let pawn = self.remove_at(square)?;
        Ok((pawn.id, self.add(pawn.side, kind, square)))
    }

    /// True when every square agrees with `rules`.
    pub fn matches(&self, rules: &dyn RulesOracle) -> bool {
        (0..64).filter_map(Square::from_index).all(|square| {
            let entity = self.at(square).map(|p| (p.side, p.kind));
            entity == rules.piece_at(square)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::ChessRules;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_from_start_position() {
        let rules = ChessRules::new();
        let registry = PieceRegistry::from_oracle(&rules);
        assert_eq!(registry.count(Side::White), 16);
        assert_eq!(registry.count(Side::Black), 16);
        assert_eq!(registry.at(sq("e1")).unwrap().kind, PieceKind::King);
        assert!(registry.matches(&rules));
    }

    #[test]
    fn test_move_and_remove() {
        let rules = ChessRules::new();
        let mut registry = PieceRegistry::from_oracle(&rules);
        let id = registry.move_piece(sq("g1"), sq("f3")).unwrap();
        assert_eq!(registry.get(id).unwrap().square, sq("f3"));
        assert!(registry.move_piece(sq("f3"), sq("f2")).is_err());

        let removed = registry.remove_at(sq("d7")).unwrap();
        assert_eq!(removed.kind, PieceKind::Pawn);
        assert_eq!(registry.count(Side::Black), 15);
        assert!(registry.remove_at(sq("d7")).is_err());
    }

    #[test]
    fn test_promote_replaces_entity() {
        let rules = ChessRules::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut registry = PieceRegistry::from_oracle(&rules);
        let pawn_id = registry.move_piece(sq("a7"), sq("a8")).unwrap();
        let (removed, knight) = registry.promote(sq("a8"), PieceKind::Knight).unwrap();
        assert_eq!(removed, pawn_id);
        assert_ne!(knight.id, pawn_id);
        assert_eq!(registry.at(sq("a8")).unwrap().kind, PieceKind::Knight);
        assert!(registry.promote(sq("e1"), PieceKind::Queen).is_err());
    }
}
