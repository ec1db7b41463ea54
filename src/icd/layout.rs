//! Slot layout resolution: maps each of a message's `wc` word positions to a
//! scalar field, a split-float pair, or a group of bitfields (spec §4.2).

use super::model::{Field, IcdError, Slot};

pub fn compute_slots(message_name: &str, wc: u8, fields: &[Field]) -> Result<Vec<Slot>, IcdError> {
    let wc = wc as usize;
    let mut occupied: Vec<Option<SlotBuilder>> = vec![None; wc];

    for (idx, field) in fields.iter().enumerate() {
        if fields[..idx].iter().any(|f| f.name == field.name) {
            return Err(IcdError::DuplicateFieldName {
                message: message_name.to_string(),
                field: field.name.clone(),
            });
        }
    }

    // Pass 1: place every field (bitfield or not) that declares an explicit
    // word_index. Bitfields are required to.
    for (idx, field) in fields.iter().enumerate() {
        if field.is_bitfield() {
            let word_index = field.word_index.ok_or_else(|| IcdError::InvalidBitfieldPlacement {
                message: message_name.to_string(),
                field: field.name.clone(),
                reason: "bitfield requires an explicit word_index".to_string(),
            })?;
            validate_bitfield_placement(message_name, field)?;
            place_bitfield(&mut occupied, message_name, word_index, idx, field)?;
        } else if let Some(word_index) = field.word_index {
            place_direct(&mut occupied, message_name, word_index, idx, field)?;
        }
    }

    // Pass 2: auto-place scalar/split fields without an explicit word_index,
    // in declaration order, into the next free slot(s).
    let mut next_free = 0usize;
    for (idx, field) in fields.iter().enumerate() {
        if field.word_index.is_some() || field.is_bitfield() {
            continue;
        }
        let width = if field.is_split() { 2 } else { 1 };
        while next_free < wc && occupied[next_free].is_some() {
            next_free += 1;
        }
        if next_free + width > wc {
            return Err(IcdError::SlotCountMismatch {
                message: message_name.to_string(),
                expected: wc as u8,
                actual: next_free + width,
            });
        }
        place_direct(&mut occupied, message_name, next_free, idx, field)?;
        next_free += width;
    }

    // Pass 3: verify non-overlap within every packed slot and finalize.
    let mut slots = Vec::with_capacity(wc);
    for (word_index, slot) in occupied.into_iter().enumerate() {
        match slot {
            Some(SlotBuilder::Scalar(idx)) => slots.push(Slot::Scalar(idx)),
            Some(SlotBuilder::SplitFirst(idx)) => slots.push(Slot::SplitFirst(idx)),
            Some(SlotBuilder::SplitSecond(idx)) => slots.push(Slot::SplitSecond(idx)),
            Some(SlotBuilder::Packed(indices)) => {
                check_no_overlap(message_name, word_index, &indices, fields)?;
                slots.push(Slot::Packed(indices));
            }
            None => {
                return Err(IcdError::SlotCountMismatch {
                    message: message_name.to_string(),
                    expected: wc as u8,
                    actual: slots.len(),
                });
            }
        }
    }

    let total_width: usize = slots
        .iter()
        .filter(|s| !matches!(s, Slot::SplitSecond(_)))
        .count()
        + slots.iter().filter(|s| matches!(s, Slot::SplitSecond(_))).count();
    if total_width != wc {
        return Err(IcdError::SlotCountMismatch {
            message: message_name.to_string(),
            expected: wc as u8,
            actual: total_width,
        });
    }

    Ok(slots)
}

#[derive(Debug, Clone)]
enum SlotBuilder {
    Scalar(usize),
    SplitFirst(usize),
    SplitSecond(usize),
    Packed(Vec<usize>),
}

fn validate_bitfield_placement(message_name: &str, field: &Field) -> Result<(), IcdError> {
    let mask = field.mask.unwrap_or(0);
    let shift = field.shift.unwrap_or(0);
    if mask == 0 {
        return Err(IcdError::InvalidBitfieldPlacement {
            message: message_name.to_string(),
            field: field.name.clone(),
            reason: "mask must be nonzero".to_string(),
        });
    }
    if ((mask as u32) << shift) & !0xFFFFu32 != 0 {
        return Err(IcdError::InvalidBitfieldPlacement {
            message: message_name.to_string(),
            field: field.name.clone(),
            reason: format!("mask 0x{mask:04X} << shift {shift} overflows a 16-bit word"),
        });
    }
    if field.is_split() {
        return Err(IcdError::InvalidBitfieldPlacement {
            message: message_name.to_string(),
            field: field.name.clone(),
            reason: "float32_split fields may not be placed as bitfields".to_string(),
        });
    }
    if matches!(field.encoding, crate::codec::Encoding::Bnr16) {
        return Err(IcdError::InvalidBitfieldPlacement {
            message: message_name.to_string(),
            field: field.name.clone(),
            reason: "bnr16 fields may not be placed as bitfields; they must occupy a full word"
                .to_string(),
        });
    }
    Ok(())
}

fn place_bitfield(
    occupied: &mut [Option<SlotBuilder>],
    message_name: &str,
    word_index: usize,
    field_idx: usize,
    field: &Field,
) -> Result<(), IcdError> {
    if word_index >= occupied.len() {
        return Err(IcdError::InvalidBitfieldPlacement {
            message: message_name.to_string(),
            field: field.name.clone(),
            reason: format!("word_index {word_index} is out of range"),
        });
    }
    match &mut occupied[word_index] {
        None => occupied[word_index] = Some(SlotBuilder::Packed(vec![field_idx])),
        Some(SlotBuilder::Packed(indices)) => indices.push(field_idx),
        Some(_) => {
            return Err(IcdError::InvalidBitfieldPlacement {
                message: message_name.to_string(),
                field: field.name.clone(),
                reason: format!("word_index {word_index} is already occupied by a scalar or split field"),
            });
        }
    }
    Ok(())
}

fn place_direct(
    occupied: &mut [Option<SlotBuilder>],
    message_name: &str,
    word_index: usize,
    field_idx: usize,
    field: &Field,
) -> Result<(), IcdError> {
    let width = if field.is_split() { 2 } else { 1 };
    if word_index + width > occupied.len() {
        return Err(IcdError::SlotCountMismatch {
            message: message_name.to_string(),
            expected: occupied.len() as u8,
            actual: word_index + width,
        });
    }
    for slot in &occupied[word_index..word_index + width] {
        if slot.is_some() {
            return Err(IcdError::InvalidBitfieldPlacement {
                message: message_name.to_string(),
                field: field.name.clone(),
                reason: format!("word_index {word_index} is already occupied"),
            });
        }
    }
    if width == 1 {
        occupied[word_index] = Some(SlotBuilder::Scalar(field_idx));
    } else {
        occupied[word_index] = Some(SlotBuilder::SplitFirst(field_idx));
        occupied[word_index + 1] = Some(SlotBuilder::SplitSecond(field_idx));
    }
    Ok(())
}

fn check_no_overlap(
    message_name: &str,
    word_index: usize,
    indices: &[usize],
    fields: &[Field],
) -> Result<(), IcdError> {
    let mut acc: u32 = 0;
    for &idx in indices {
        let field = &fields[idx];
        let mask = field.mask.unwrap_or(0) as u32;
        let shift = field.shift.unwrap_or(0);
        let placed = mask << shift;
        if acc & placed != 0 {
            // Find which earlier field collides, for a precise error.
            for &other_idx in indices {
                if other_idx == idx {
                    continue;
                }
                let other = &fields[other_idx];
                let other_placed = (other.mask.unwrap_or(0) as u32) << other.shift.unwrap_or(0);
                if other_placed & placed != 0 {
                    return Err(IcdError::BitfieldOverlap {
                        message: message_name.to_string(),
                        word_index,
                        a: other.name.clone(),
                        b: field.name.clone(),
                    });
                }
            }
        }
        acc |= placed;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encoding;

    fn scalar_field(name: &str) -> Field {
        Field {
            name: name.to_string(),
            encoding: Encoding::U16,
            scale: 1.0,
            offset: 0.0,
            min: None,
            max: None,
            const_value: None,
            word_index: None,
            mask: None,
            shift: None,
            source: None,
        }
    }

    fn bitfield(name: &str, word_index: usize, mask: u16, shift: u32) -> Field {
        Field {
            mask: Some(mask),
            shift: Some(shift),
            word_index: Some(word_index),
            ..scalar_field(name)
        }
    }

    #[test]
    fn single_scalar_field_fills_one_word() {
        let fields = vec![scalar_field("data")];
        let slots = compute_slots("TEST", 1, &fields).unwrap();
        assert_eq!(slots, vec![Slot::Scalar(0)]);
    }

    #[test]
    fn auto_placement_preserves_declaration_order() {
        let fields = vec![scalar_field("a"), scalar_field("b")];
        let slots = compute_slots("TEST", 2, &fields).unwrap();
        assert_eq!(slots, vec![Slot::Scalar(0), Slot::Scalar(1)]);
    }

    #[test]
    fn split_float_consumes_two_slots() {
        let mut field = scalar_field("lat");
        field.encoding = Encoding::Float32Split {
            word_order: crate::codec::WordOrder::LswMsw,
        };
        let slots = compute_slots("TEST", 2, &[field]).unwrap();
        assert_eq!(slots, vec![Slot::SplitFirst(0), Slot::SplitSecond(0)]);
    }

    #[test]
    fn non_overlapping_bitfields_share_a_slot() {
        let fields = vec![
            bitfield("a", 0, 0x00FF, 0),
            bitfield("b", 0, 0x00FF, 8),
        ];
        let slots = compute_slots("TEST", 1, &fields).unwrap();
        assert_eq!(slots, vec![Slot::Packed(vec![0, 1])]);
    }

    #[test]
    fn overlapping_bitfields_are_rejected() {
        let fields = vec![
            bitfield("a", 0, 0x00FF, 0),
            bitfield("b", 0, 0x0FF0, 0),
        ];
        let err = compute_slots("TEST", 1, &fields).unwrap_err();
        assert!(matches!(err, IcdError::BitfieldOverlap { .. }));
    }

    #[test]
    fn slot_count_mismatch_detected() {
        let fields = vec![scalar_field("a")];
        let err = compute_slots("TEST", 2, &fields).unwrap_err();
        assert!(matches!(err, IcdError::SlotCountMismatch { .. }));
    }

    #[test]
    fn bnr_field_cannot_be_placed_as_bitfield() {
        let mut field = bitfield("a", 0, 0x00FF, 0);
        field.encoding = Encoding::Bnr16;
        let fields = vec![field];
        let err = compute_slots("TEST", 1, &fields).unwrap_err();
        assert!(matches!(err, IcdError::InvalidBitfieldPlacement { .. }));
    }
}
