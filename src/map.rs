use fxhash::FxHashMap;
use std::collections::hash_map;
use std::mem;

/// A mapping from folder name to child. Most folders hold zero or one
/// child, so those cases are stored inline; the hash map is only
/// allocated on the second insertion.
pub(crate) struct Map<V> {
    inner: MapInner<V>,
}

enum MapInner<V> {
    Empty,
    One(String, V),
    Map(Box<FxHashMap<String, V>>),
}

impl<V> Default for Map<V> {
    fn default() -> Self {
        Map {
            inner: MapInner::Empty,
        }
    }
}

impl<V> Map<V> {
    pub(crate) fn get(&self, name: &str) -> Option<&V> {
        match &self.inner {
            MapInner::One(one_name, one) if one_name == name => Some(one),
            MapInner::Map(map) => map.get(name),
            MapInner::Empty | MapInner::One(..) => None,
        }
    }

    pub(crate) fn insert(&mut self, name: String, value: V) -> Option<V> {
        match self.inner {
            MapInner::Empty => {
                self.inner = MapInner::One(name, value);
                None
            }
            MapInner::One(..) => {
                let (one_name, one) = match mem::replace(&mut self.inner, MapInner::Empty) {
                    MapInner::One(one_name, one) => (one_name, one),
                    _ => unreachable!(),
                };
                if one_name == name {
                    self.inner = MapInner::One(name, value);
                    return Some(one);
                }
                let mut map = Box::<FxHashMap<String, V>>::default();
                map.insert(one_name, one);
                map.insert(name, value);
                self.inner = MapInner::Map(map);
                None
            }
            MapInner::Map(ref mut map) => map.insert(name, value),
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<V> {
        match &mut self.inner {
            MapInner::One(one_name, _) if one_name == name => {
                match mem::replace(&mut self.inner, MapInner::Empty) {
                    MapInner::One(_, one) => Some(one),
                    _ => unreachable!(),
                }
            }
            MapInner::Map(map) => map.remove(name),
            MapInner::Empty | MapInner::One(..) => None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match &self.inner {
            MapInner::Empty => 0,
            MapInner::One(..) => 1,
            MapInner::Map(map) => map.len(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn iter(&self) -> Iter<'_, V> {
        match &self.inner {
            MapInner::Empty => Iter::One(None),
            MapInner::One(name, one) => Iter::One(Some((name, one))),
            MapInner::Map(map) => Iter::Map(map.iter()),
        }
    }
}

pub(crate) enum Iter<'a, V> {
    One(Option<(&'a String, &'a V)>),
    Map(hash_map::Iter<'a, String, V>),
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::One(one) => one.take().map(|(name, value)| (name.as_str(), value)),
            Iter::Map(iter) => iter.next().map(|(name, value)| (name.as_str(), value)),
        }
    }
}
