//! Applies moves to the rules oracle and mirrors every side effect onto the
//! piece registry.
//!
//! Each apply works on a copy of the registry and only swaps it in once the
//! whole move (capture, rook relocation, promotion) has been mirrored. If
//! mirroring fails the oracle move is undone, so a half-applied castle is
//! never observable.

use serde::Serialize;
use tracing::debug;

use chess_core::{MoveDescriptor, PieceKind, RulesOracle, Square};

use crate::error::MoveError;
use crate::pieces::{PieceEntity, PieceId, PieceRegistry};

/// Who is moving. Humans choose their promotion piece; AI moves always
/// promote to a queen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mover {
    Human,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PromotionToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPromotion {
    pub token: PromotionToken,
    pub from: Square,
    pub to: Square,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// Waiting for [`MoveEngine::finalize_promotion`].
    Pending(PromotionToken),
    Completed {
        removed_pawn: PieceId,
        promoted: PieceEntity,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub descriptor: MoveDescriptor,
    pub captured_piece_id: Option<PieceId>,
    pub promotion: Option<PromotionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedPromotion {
    pub descriptor: MoveDescriptor,
    pub removed_pawn: PieceId,
    pub promoted: PieceEntity,
}

pub struct MoveEngine {
    rules: Box<dyn RulesOracle>,
    pieces: PieceRegistry,
    pending: Option<PendingPromotion>,
    next_token: u64,
}

impl MoveEngine {
    pub fn new(rules: Box<dyn RulesOracle>) -> Self {
        let pieces = PieceRegistry::from_oracle(rules.as_ref());
        Self {
            rules,
            pieces,
            pending: None,
            next_token: 0,
        }
    }

    pub fn rules(&self) -> &dyn RulesOracle {
        self.rules.as_ref()
    }

    pub fn pieces(&self) -> &PieceRegistry {
        &self.pieces
    }

    pub fn pending(&self) -> Option<&PendingPromotion> {
        self.pending.as_ref()
    }

    /// Apply `uci` (source, destination, optional promotion letter).
    pub fn apply(&mut self, uci: &str, mover: Mover) -> Result<ApplyOutcome, MoveError> {
        if self.pending.is_some() {
            return Err(MoveError::PromotionPending);
        }

        let uci = uci.trim().to_ascii_lowercase();
        let (from, to) = parse_squares(&uci)?;
        let candidates: Vec<MoveDescriptor> = self
            .rules
            .legal_moves_from(from)
            .into_iter()
            .filter(|m| m.to == to)
            .collect();
        if candidates.is_empty() {
            return Err(MoveError::IllegalMove(uci));
        }

        let is_promotion = candidates.iter().any(MoveDescriptor::is_promotion);
        let to_play = if is_promotion {
            // Humans get a provisional queen until they pick; AI is forced to one.
            format!("{from}{to}q")
        } else if candidates.iter().any(|m| m.uci() == uci) {
            uci.clone()
        } else {
            return Err(MoveError::IllegalMove(uci));
        };

        let descriptor = self.rules.apply_move(&to_play)?;
        let mut next = self.pieces.clone();
        let captured_piece_id = match mirror_move(&mut next, &descriptor) {
            Ok(id) => id,
            Err(e) => {
                self.rollback();
                return Err(e);
            }
        };

        let promotion = match (is_promotion, mover) {
            (false, _) => None,
            (true, Mover::Human) => {
                self.next_token += 1;
                let token = PromotionToken(self.next_token);
                self.pending = Some(PendingPromotion { token, from, to });
                debug!(from = %from, to = %to, "Promotion pending");
                Some(PromotionOutcome::Pending(token))
            }
            (true, Mover::Ai) => match next.promote(to, PieceKind::Queen) {
                Ok((removed_pawn, promoted)) => Some(PromotionOutcome::Completed {
                    removed_pawn,
                    promoted,
                }),
                Err(e) => {
                    self.rollback();
                    return Err(e);
                }
            },
        };

        self.pieces = next;
        Ok(ApplyOutcome {
            descriptor,
            captured_piece_id,
            promotion,
        })
    }

    /// Complete a pending human promotion with `kind`. The provisional move is
    /// taken back and replayed with the chosen letter so the position (and
    /// every later legality query) sees the real piece.
    pub fn finalize_promotion(
        &mut self,
        token: PromotionToken,
        kind: PieceKind,
    ) -> Result<FinalizedPromotion, MoveError> {
        let pending = self.pending.clone().ok_or(MoveError::NoPendingPromotion)?;
        if pending.token != token {
            return Err(MoveError::TokenMismatch);
        }
        if !kind.is_promotion_target() {
            return Err(MoveError::InvalidPromotionPiece(kind));
        }

        let provisional = self.rules.undo()?;
        let uci = format!("{}{}{}", pending.from, pending.to, kind.letter());
        let descriptor = match self.rules.apply_move(&uci) {
            Ok(d) => d,
            Err(e) => {
                // Put the provisional move back so the pending state stays valid.
                self.rules.apply_move(&provisional.uci())?;
                return Err(e.into());
            }
        };

        let mut next = self.pieces.clone();
        let (removed_pawn, promoted) = next.promote(pending.to, kind)?;
        self.pieces = next;
        self.pending = None;
        debug!(uci = %uci, "Promotion finalized");

        Ok(FinalizedPromotion {
            descriptor,
            removed_pawn,
            promoted,
        })
    }

    fn rollback(&mut self) {
        if let Err(e) = self.rules.undo() {
            debug!(error = %e, "Rollback found nothing to undo");
        }
    }
}

fn parse_squares(uci: &str) -> Result<(Square, Square), MoveError> {
    let illegal = || MoveError::IllegalMove(uci.to_string());
    if !(4..=5).contains(&uci.len()) || !uci.is_ascii() {
        return Err(illegal());
    }
    let from = uci[0..2].parse().map_err(|_| illegal())?;
    let to = uci[2..4].parse().map_err(|_| illegal())?;
    Ok((from, to))
}

/// Mirror `descriptor` onto `pieces`: remove the captured piece (behind the
/// destination for en passant), move the mover, then the castling rook.
fn mirror_move(pieces: &mut PieceRegistry, descriptor: &MoveDescriptor) -> Result<Option<PieceId>, MoveError> {
    let captured = match descriptor.capture_square() {
        Some(square) => Some(pieces.remove_at(square)?.id),
        None => None,
    };
    pieces.move_piece(descriptor.from, descriptor.to)?;
    if let Some((rook_from, rook_to)) = descriptor.rook_relocation() {
        pieces.move_piece(rook_from, rook_to)?;
    }
    Ok(captured)
}
