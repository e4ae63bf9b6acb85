// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Agent records and the sparse field sets carried by incremental updates.
//!
//! Every record kind is declared once through [`mirror_record!`], which emits
//! the full record (what the renderer sees) next to its `Option`-per-field
//! twin (what the wire delivers). Merging only ever overwrites fields that are
//! present in the incoming set; nothing is reset to a default after creation.

use serde::{Deserialize, Serialize};

use crate::color::AgentColor;
use crate::ident::{AgentId, BreedRank};

/// Sparse field set carried by an update.
pub trait FieldSet: Clone + Default + std::fmt::Debug {
    /// Overwrite every field present in `incoming`, leaving the rest untouched.
    fn absorb(&mut self, incoming: &Self);
    /// True when every field is present.
    fn is_filled(&self) -> bool;
}

/// Anything with a world position a camera can center on.
pub trait Located {
    /// Position in patch coordinates.
    fn anchor(&self) -> (f64, f64);
}

macro_rules! mirror_record {
    (
        $(#[$rmeta:meta])*
        record $record:ident, fields $fields:ident, id $id_name:ident: $id_ty:ty {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty = $default:expr ),+ $(,)?
        }
    ) => {
        $(#[$rmeta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $record {
            /// Identity key.
            pub $id_name: $id_ty,
            $( $(#[$fmeta])* pub $field: $ty, )+
        }

        #[doc = concat!("Sparse field set for [`", stringify!($record), "`] updates; `None` means unchanged.")]
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $fields {
            $(
                $(#[$fmeta])*
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl FieldSet for $fields {
            fn absorb(&mut self, incoming: &Self) {
                $(
                    if let Some(value) = &incoming.$field {
                        self.$field = Some(value.clone());
                    }
                )+
            }

            fn is_filled(&self) -> bool {
                true $( && self.$field.is_some() )+
            }
        }

        impl $record {
            /// Record holding protocol defaults for every field.
            pub fn blank($id_name: $id_ty) -> Self {
                Self {
                    $id_name,
                    $( $field: $default, )+
                }
            }

            /// Build a record from a field set; absent fields take their defaults.
            pub fn from_fields($id_name: $id_ty, fields: &$fields) -> Self {
                let mut record = Self::blank($id_name);
                record.merge(fields);
                record
            }

            /// Overwrite the fields present in `fields`.
            pub fn merge(&mut self, fields: &$fields) {
                $(
                    if let Some(value) = &fields.$field {
                        self.$field = value.clone();
                    }
                )+
            }

            /// Every field of this record as a filled field set.
            pub fn to_fields(&self) -> $fields {
                $fields {
                    $( $field: Some(self.$field.clone()), )+
                }
            }
        }
    };
}

mirror_record! {
    /// A mirrored turtle.
    record Turtle, fields TurtleFields, id id: AgentId {
        /// X position in patch coordinates.
        xcor: f64 = 0.0,
        /// Y position in patch coordinates.
        ycor: f64 = 0.0,
        /// Heading in degrees, clockwise from north.
        heading: f64 = 0.0,
        /// Shape name.
        shape: String = String::from("default"),
        /// Body color.
        color: AgentColor = AgentColor::default(),
        /// Scale relative to a patch.
        size: f64 = 1.0,
        /// Hidden turtles are mirrored but not drawn.
        hidden: bool = false,
        /// Label text (empty for none).
        label: String = String::new(),
        /// Label color.
        label_color: AgentColor = AgentColor::Indexed(9.9),
        /// Pen width for line-based shapes.
        line_thickness: f64 = 0.0,
        /// Draw layer of the turtle's breed.
        breed_rank: BreedRank = 0,
    }
}

mirror_record! {
    /// A mirrored link between two turtles.
    record Link, fields LinkFields, id id: AgentId {
        /// Id of the first endpoint turtle.
        end1: AgentId = 0,
        /// Id of the second endpoint turtle.
        end2: AgentId = 0,
        /// X of the first endpoint.
        x1: f64 = 0.0,
        /// Y of the first endpoint.
        y1: f64 = 0.0,
        /// X of the second endpoint.
        x2: f64 = 0.0,
        /// Y of the second endpoint.
        y2: f64 = 0.0,
        /// Heading from end1 to end2 in degrees.
        heading: f64 = 0.0,
        /// Length in patch units.
        size: f64 = 0.0,
        /// Shape name.
        shape: String = String::from("default"),
        /// Line color.
        color: AgentColor = AgentColor::Indexed(5.0),
        /// Hidden links are mirrored but not drawn.
        hidden: bool = false,
        /// Directed links draw an arrowhead at end2.
        directed: bool = false,
        /// Label text (empty for none).
        label: String = String::new(),
        /// Label color.
        label_color: AgentColor = AgentColor::Indexed(9.9),
        /// Line width.
        line_thickness: f64 = 0.0,
        /// Draw layer of the link's breed.
        breed_rank: BreedRank = 0,
    }
}

mirror_record! {
    /// A mirrored patch, addressed by its linear grid index.
    record Patch, fields PatchFields, id index: usize {
        /// Column coordinate.
        pxcor: i32 = 0,
        /// Row coordinate.
        pycor: i32 = 0,
        /// Fill color.
        pcolor: AgentColor = AgentColor::default(),
        /// Label text (empty for none).
        plabel: String = String::new(),
        /// Label color.
        plabel_color: AgentColor = AgentColor::Indexed(9.9),
    }
}

impl Located for Turtle {
    fn anchor(&self) -> (f64, f64) {
        (self.xcor, self.ycor)
    }
}

impl Located for Link {
    fn anchor(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }
}

impl Located for Patch {
    fn anchor(&self) -> (f64, f64) {
        (f64::from(self.pxcor), f64::from(self.pycor))
    }
}

/// One turtle or link update as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate<F> {
    /// Identity of the target agent.
    pub id: AgentId,
    /// The update carries every field and can stand alone.
    pub complete: bool,
    /// The agent was removed server-side; `fields` is ignored.
    pub dead: bool,
    /// Fields changed since the last tick.
    pub fields: F,
}

impl<F: FieldSet> EntityUpdate<F> {
    /// A complete (creating) update.
    pub fn complete(id: AgentId, fields: F) -> Self {
        Self {
            id,
            complete: true,
            dead: false,
            fields,
        }
    }

    /// An incremental update carrying only changed fields.
    pub fn partial(id: AgentId, fields: F) -> Self {
        Self {
            id,
            complete: false,
            dead: false,
            fields,
        }
    }

    /// A removal.
    pub fn death(id: AgentId) -> Self {
        Self {
            id,
            complete: false,
            dead: true,
            fields: F::default(),
        }
    }
}

/// Turtle update.
pub type TurtleUpdate = EntityUpdate<TurtleFields>;
/// Link update.
pub type LinkUpdate = EntityUpdate<LinkFields>;

/// One patch update; patches are never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchUpdate {
    /// Linear grid index.
    pub index: usize,
    /// The update carries every field.
    pub complete: bool,
    /// Fields changed since the last tick.
    pub fields: PatchFields,
}

impl PatchUpdate {
    /// A complete patch update.
    pub fn complete(index: usize, fields: PatchFields) -> Self {
        Self {
            index,
            complete: true,
            fields,
        }
    }

    /// An incremental patch update.
    pub fn partial(index: usize, fields: PatchFields) -> Self {
        Self {
            index,
            complete: false,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut turtle = Turtle::blank(4);
        turtle.merge(&TurtleFields {
            xcor: Some(3.5),
            label: Some("scout".into()),
            ..TurtleFields::default()
        });
        turtle.merge(&TurtleFields {
            ycor: Some(-2.0),
            ..TurtleFields::default()
        });
        assert_eq!(turtle.xcor, 3.5);
        assert_eq!(turtle.ycor, -2.0);
        assert_eq!(turtle.label, "scout");
        assert_eq!(turtle.shape, "default");
    }

    #[test]
    fn absorb_accumulates_and_detects_fill() {
        let mut pending = PatchFields {
            pxcor: Some(1),
            pycor: Some(2),
            ..PatchFields::default()
        };
        assert!(!pending.is_filled());
        pending.absorb(&PatchFields {
            pcolor: Some(AgentColor::Indexed(15.0)),
            plabel: Some(String::new()),
            plabel_color: Some(AgentColor::Indexed(0.0)),
            pxcor: Some(7),
            ..PatchFields::default()
        });
        assert!(pending.is_filled());
        assert_eq!(pending.pxcor, Some(7));
        assert_eq!(pending.pycor, Some(2));
    }

    #[test]
    fn to_fields_round_trips_through_from_fields() {
        let mut link = Link::blank(9);
        link.end1 = 1;
        link.end2 = 2;
        link.directed = true;
        let fields = link.to_fields();
        assert!(fields.is_filled());
        assert_eq!(Link::from_fields(9, &fields), link);
    }

    #[test]
    fn link_anchor_is_the_midpoint() {
        let mut link = Link::blank(1);
        link.x1 = -2.0;
        link.x2 = 4.0;
        link.y1 = 1.0;
        link.y2 = 3.0;
        assert_eq!(link.anchor(), (1.0, 2.0));
    }
}
