//! Bone hierarchy.
//!
//! Bones are stored in a flat arena indexed by their position in the file.
//! Parents and children are indices into that arena, so the hierarchy has no
//! ownership cycles and can be shared freely once built.

use crate::error::{IndexKind, ModelError, Section};
use crate::math::{Mat4, Vec3, mat4_from_translation};
use crate::reader::DataReader;

/// Parent value that marks a root bone in binary files.
pub const NO_PARENT: i16 = i16::MAX;

/// Name prefix of placeholder bones that may list themselves as parent.
const UNUSED_PREFIX: &str = "unused";

/// Smallest possible bone record in a binary file, used to reject
/// impossible bone counts before allocating.
pub(crate) const MIN_BONE_RECORD_SIZE: usize = 15;

/// Upper bound on speculative preallocation for sources of unknown length.
const MAX_PREALLOCATED_BONES: usize = 1024;

/// A bone record as stored in the file, before the hierarchy is linked.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneRecord {
    /// Bone name.
    pub name: String,
    /// Declared parent index, `None` for the no-parent sentinel.
    pub parent: Option<usize>,
    /// Rest position.
    pub position: Vec3,
}

impl BoneRecord {
    /// Create a record.
    pub fn new(name: impl Into<String>, parent: Option<usize>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            parent,
            position,
        }
    }

    /// Read one record: name, i16 parent and three floats.
    ///
    /// `i16::MAX` and any negative parent value mean no parent.
    pub fn read(reader: &mut impl DataReader) -> Self {
        let name = reader.read_pascal_string();
        let parent = match reader.read_i16() {
            NO_PARENT => None,
            p if p < 0 => None,
            p => Some(p as usize),
        };
        let x = reader.read_f32();
        let y = reader.read_f32();
        let z = reader.read_f32();
        Self::new(name, parent, Vec3::new(x, y, z))
    }
}

/// A linked bone.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    name: String,
    declared_parent: Option<usize>,
    position: Vec3,
    position_matrix: Mat4,
    inverse_position_matrix: Mat4,
    parent: Option<usize>,
    children: Vec<usize>,
    parent_model_bone: Option<usize>,
}

impl Bone {
    /// Bone name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent index as declared in the file, `None` for the sentinel.
    ///
    /// Differs from [`Bone::parent`] only for self-parented placeholder bones.
    pub fn declared_parent(&self) -> Option<usize> {
        self.declared_parent
    }

    /// Rest position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Translation to the rest position.
    pub fn position_matrix(&self) -> &Mat4 {
        &self.position_matrix
    }

    /// Translation back from the rest position.
    pub fn inverse_position_matrix(&self) -> &Mat4 {
        &self.inverse_position_matrix
    }

    /// Linked parent index.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Indices of the bones whose parent is this one, in file order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Whether this bone has no linked parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Index of the same-named bone in the parent model this bone defers to.
    pub fn parent_model_bone(&self) -> Option<usize> {
        self.parent_model_bone
    }
}

/// All bones of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bones {
    bones: Vec<Bone>,
}

impl Bones {
    /// Link raw records into a hierarchy.
    ///
    /// A bone listing itself as parent is accepted as a root only when its
    /// name starts with `unused`. Parents must be in range and no bone may be
    /// its own ancestor.
    pub fn build(records: Vec<BoneRecord>) -> Result<Self, ModelError> {
        let count = records.len();
        let mut bones = Vec::with_capacity(count);

        for (index, record) in records.into_iter().enumerate() {
            let parent = match record.parent {
                None => None,
                Some(p) if p == index => {
                    if record.name.starts_with(UNUSED_PREFIX) {
                        None
                    } else {
                        return Err(ModelError::CircularReference {
                            bone: index,
                            name: record.name,
                        });
                    }
                }
                Some(p) if p >= count => {
                    return Err(ModelError::IndexOutOfRange {
                        kind: IndexKind::BoneParent,
                        index: p,
                        limit: count,
                    });
                }
                Some(p) => Some(p),
            };
            bones.push(Bone {
                position_matrix: mat4_from_translation(record.position),
                inverse_position_matrix: mat4_from_translation(-record.position),
                name: record.name,
                declared_parent: record.parent,
                position: record.position,
                parent,
                children: Vec::new(),
                parent_model_bone: None,
            });
        }

        for start in 0..count {
            let mut current = bones[start].parent;
            let mut steps = 0;
            while let Some(ancestor) = current {
                steps += 1;
                if ancestor == start || steps > count {
                    return Err(ModelError::CircularReference {
                        bone: start,
                        name: bones[start].name.clone(),
                    });
                }
                current = bones[ancestor].parent;
            }
        }

        for index in 0..count {
            if let Some(parent) = bones[index].parent {
                bones[parent].children.push(index);
            }
        }

        Ok(Self { bones })
    }

    /// Read `count` bone records and link them.
    pub fn read(reader: &mut impl DataReader, count: usize) -> Result<Self, ModelError> {
        reader.ensure_fits(count, MIN_BONE_RECORD_SIZE, Section::Bones)?;
        let mut records = Vec::with_capacity(count.min(MAX_PREALLOCATED_BONES));
        for _ in 0..count {
            reader.checkpoint(Section::Bones)?;
            records.push(BoneRecord::read(reader));
        }
        reader.checkpoint(Section::Bones)?;
        Self::build(records)
    }

    /// Defer every bone that `parent` also has to the parent's bone.
    ///
    /// Such bones take the parent's rest position and remember the parent's
    /// index. The hierarchy inside this model is left as linked.
    pub fn share_with_parent(&mut self, parent: &Bones) {
        for bone in &mut self.bones {
            let Some(index) = parent.index_of(&bone.name) else {
                continue;
            };
            let shared = &parent.bones[index];
            bone.position = shared.position;
            bone.position_matrix = shared.position_matrix;
            bone.inverse_position_matrix = shared.inverse_position_matrix;
            bone.parent_model_bone = Some(index);
        }
    }

    /// Number of bones.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether the model has no bones.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Bone at `index`.
    pub fn get(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// First bone named `name`.
    pub fn by_name(&self, name: &str) -> Option<&Bone> {
        self.bones.iter().find(|b| b.name == name)
    }

    /// Index of the first bone named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Indices of all bones without a parent, in file order.
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_root())
            .map(|(i, _)| i)
    }

    /// Iterate over all bones in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Bone> {
        self.bones.iter()
    }
}

impl std::ops::Index<usize> for Bones {
    type Output = Bone;

    fn index(&self, index: usize) -> &Bone {
        &self.bones[index]
    }
}

impl<'a> IntoIterator for &'a Bones {
    type Item = &'a Bone;
    type IntoIter = std::slice::Iter<'a, Bone>;

    fn into_iter(self) -> Self::IntoIter {
        self.bones.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{BinaryReader, TextReader};

    fn record(name: &str, parent: Option<usize>) -> BoneRecord {
        BoneRecord::new(name, parent, Vec3::new(1.0, 2.0, 3.0))
    }

    #[test]
    fn test_two_bone_chain() {
        let bones = Bones::build(vec![record("root", None), record("arm", Some(0))]).unwrap();
        assert_eq!(bones.len(), 2);
        assert_eq!(bones[1].parent(), Some(0));
        assert_eq!(bones[0].children(), &[1]);
        assert!(bones[1].children().is_empty());
        assert_eq!(bones.roots().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_position_matrices() {
        let bones = Bones::build(vec![record("root", None)]).unwrap();
        let bone = &bones[0];
        assert_eq!(bone.position_matrix()[(1, 3)], 2.0);
        assert_eq!(bone.inverse_position_matrix()[(2, 3)], -3.0);
        let product = bone.position_matrix() * bone.inverse_position_matrix();
        assert!((product - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_unused_self_parent_is_root() {
        let bones = Bones::build(vec![record("root", None), record("unused12", Some(1))]).unwrap();
        assert!(bones[1].is_root());
        assert_eq!(bones[1].declared_parent(), Some(1));
        assert_eq!(bones.roots().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_share_with_parent() {
        let parent = Bones::build(vec![
            BoneRecord::new("root", None, Vec3::zeros()),
            BoneRecord::new("head", Some(0), Vec3::new(0.0, 1.5, 0.0)),
        ])
        .unwrap();
        let mut item = Bones::build(vec![record("head", None), record("hat", Some(0))]).unwrap();
        item.share_with_parent(&parent);

        assert_eq!(item[0].parent_model_bone(), Some(1));
        assert_eq!(item[0].position(), Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(item[0].position_matrix(), parent[1].position_matrix());
        assert_eq!(item[1].parent_model_bone(), None);
        assert_eq!(item[1].position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(item[1].parent(), Some(0));
    }

    #[test]
    fn test_read_text_huge_count() {
        let mut reader = TextReader::new("root\n-1\n0 0 0\n");
        let err = Bones::read(&mut reader, u32::MAX as usize).unwrap_err();
        assert!(matches!(
            err,
            ModelError::PrematureEndOfFile {
                section: Section::Bones,
                ..
            }
        ));
    }

    #[test]
    fn test_self_parent_is_circular() {
        let err = Bones::build(vec![record("root", None), record("arm", Some(1))]).unwrap_err();
        assert!(matches!(err, ModelError::CircularReference { bone: 1, .. }));
    }

    #[test]
    fn test_parent_out_of_range() {
        let err = Bones::build(vec![record("root", None), record("arm", Some(2))]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::IndexOutOfRange {
                kind: IndexKind::BoneParent,
                index: 2,
                limit: 2
            }
        ));
    }

    #[test]
    fn test_longer_cycle() {
        let err = Bones::build(vec![
            record("root", None),
            record("a", Some(3)),
            record("b", Some(1)),
            record("c", Some(2)),
        ])
        .unwrap_err();
        assert!(matches!(err, ModelError::CircularReference { bone: 1, .. }));
    }

    #[test]
    fn test_by_name() {
        let bones = Bones::build(vec![record("root", None), record("arm", Some(0))]).unwrap();
        assert_eq!(bones.by_name("arm").map(Bone::parent), Some(Some(0)));
        assert_eq!(bones.index_of("root"), Some(0));
        assert!(bones.by_name("leg").is_none());
    }

    #[test]
    fn test_read_binary_record() {
        let mut bytes = vec![4, b'r', b'o', b'o', b't'];
        bytes.extend_from_slice(&NO_PARENT.to_le_bytes());
        for v in [0.5f32, 1.0, -2.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let mut reader = BinaryReader::new(&bytes);
        let rec = BoneRecord::read(&mut reader);
        assert_eq!(rec, BoneRecord::new("root", None, Vec3::new(0.5, 1.0, -2.0)));
    }

    #[test]
    fn test_read_text_negative_parent() {
        let mut reader = TextReader::new("2\nroot\n-1\n0 0 0\nhead\n0\n0 1.5 0\n");
        let count = reader.read_u32() as usize;
        let bones = Bones::read(&mut reader, count).unwrap();
        assert!(bones[0].is_root());
        assert_eq!(bones[1].parent(), Some(0));
        assert_eq!(bones[1].position(), Vec3::new(0.0, 1.5, 0.0));
    }

    #[test]
    fn test_read_rejects_impossible_count() {
        let bytes = [0u8; 20];
        let mut reader = BinaryReader::new(&bytes);
        let err = Bones::read(&mut reader, 2).unwrap_err();
        assert!(matches!(
            err,
            ModelError::PrematureEndOfFile {
                section: Section::Bones,
                ..
            }
        ));
    }
}
