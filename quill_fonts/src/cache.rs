// Copyright 2026 the Quill Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded cache of opened faces and scaled sizes shared by every font.

use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};

use crate::source::metrics_sidecar;
use crate::{
    CharMapEncoding, Error, ErrorKind, F26Dot6, FaceFlags, FaceInfo, FontBackend, FontFace,
    FontId, FontSource, SizeMetrics,
};

/// Limits for a [`FaceCache`].
#[derive(Copy, Clone, Debug)]
pub struct FaceCacheOptions {
    /// Maximum number of open faces.
    ///
    /// The default value is 4.
    pub max_faces: usize,
    /// Maximum number of scaled sizes across all faces.
    ///
    /// The default value is 8.
    pub max_sizes: usize,
    /// Byte budget shared by all scaled sizes.
    ///
    /// The default value is 400 000.
    pub max_bytes: usize,
    /// Resolution sizes are scaled at.
    ///
    /// The default value is [`DPI`](crate::DPI).
    pub dpi: u32,
    /// Entries kept in the codepoint to glyph index cache before it is pruned.
    ///
    /// The default value is 4096.
    pub max_charmap_entries: usize,
}

impl Default for FaceCacheOptions {
    fn default() -> Self {
        Self {
            max_faces: 4,
            max_sizes: 8,
            max_bytes: 400_000,
            dpi: crate::DPI,
            max_charmap_entries: 4096,
        }
    }
}

/// A generation checked reference to a cached face.
///
/// Holding one does not keep the face alive: once the cache evicts the face
/// the reference goes stale and [`FaceCache::get_face`] returns `None`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceRef(SlotRef);

/// A generation checked reference to a cached size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SizeRef(SlotRef);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct SlotRef {
    index: u32,
    generation: u32,
}

/// A face resolved through the cache.
#[derive(Clone)]
pub struct FaceLease {
    /// Reference to store on the font for the next lookup.
    pub face_ref: FaceRef,
    /// The face, leased for the duration of the caller's operation.
    pub face: Arc<dyn FontFace>,
    /// Set when the face was (re)opened by this call.
    pub opened: Option<FaceInfo>,
}

impl fmt::Debug for FaceLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaceLease")
            .field("face_ref", &self.face_ref)
            .field("face", &self.face)
            .field("opened", &self.opened)
            .finish()
    }
}

struct Slot<T> {
    generation: u32,
    entry: Option<T>,
}

/// Slots whose generation is bumped every time they are vacated.
struct Slots<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Slots<T> {
    fn new() -> Self {
        Self { slots: Vec::new() }
    }

    fn get(&self, slot_ref: SlotRef) -> Option<&T> {
        let slot = self.slots.get(slot_ref.index as usize)?;
        if slot.generation != slot_ref.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn find(&self, mut f: impl FnMut(&T) -> bool) -> Option<(SlotRef, &T)> {
        self.iter().find(|(_, entry)| f(entry))
    }

    fn iter(&self) -> impl Iterator<Item = (SlotRef, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let entry = slot.entry.as_ref()?;
            let slot_ref = SlotRef {
                index: u32::try_from(index).ok()?,
                generation: slot.generation,
            };
            Some((slot_ref, entry))
        })
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }

    fn insert(&mut self, entry: T) -> SlotRef {
        if let Some(index) = self.slots.iter().position(|slot| slot.entry.is_none()) {
            let slot = &mut self.slots[index];
            slot.entry = Some(entry);
            return SlotRef {
                index: u32::try_from(index).unwrap_or(u32::MAX),
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        SlotRef {
            index: u32::try_from(self.slots.len() - 1).unwrap_or(u32::MAX),
            generation: 0,
        }
    }

    fn remove(&mut self, slot_ref: SlotRef) -> Option<T> {
        let slot = self.slots.get_mut(slot_ref.index as usize)?;
        if slot.generation != slot_ref.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(entry)
    }

    fn remove_where(&mut self, mut f: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut removed = Vec::new();
        for slot in &mut self.slots {
            if slot.entry.as_ref().is_some_and(&mut f) {
                removed.extend(slot.entry.take());
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        removed
    }
}

struct FaceEntry {
    id: FontId,
    face: Arc<dyn FontFace>,
    last_used: AtomicU64,
}

struct SizeEntry {
    id: FontId,
    size: F26Dot6,
    metrics: SizeMetrics,
    cost: usize,
    last_used: AtomicU64,
}

trait Recency {
    fn last_used(&self) -> u64;
}

impl Recency for FaceEntry {
    fn last_used(&self) -> u64 {
        self.last_used.load(Ordering::Relaxed)
    }
}

impl Recency for SizeEntry {
    fn last_used(&self) -> u64 {
        self.last_used.load(Ordering::Relaxed)
    }
}

fn least_recent<T: Recency>(slots: &Slots<T>) -> Option<SlotRef> {
    slots
        .iter()
        .min_by_key(|(_, entry)| entry.last_used())
        .map(|(slot_ref, _)| slot_ref)
}

struct Tables {
    faces: Slots<FaceEntry>,
    sizes: Slots<SizeEntry>,
    size_bytes: usize,
}

/// Process wide cache of opened faces and scaled sizes.
///
/// Fonts do not own their faces. They hold a [`FaceRef`] and re-resolve
/// through the cache, which reopens evicted faces from the font's source on
/// demand. Opening and closing faces is serialized by one mutex; lookups of
/// live entries only take a shared lock.
pub struct FaceCache {
    backend: Arc<dyn FontBackend>,
    options: FaceCacheOptions,
    io_lock: Mutex<()>,
    tables: RwLock<Tables>,
    clock: AtomicU64,
    charmap: Mutex<HashMap<(FontId, u32), u32>>,
}

impl fmt::Debug for FaceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self.tables.read();
        f.debug_struct("FaceCache")
            .field("backend", &self.backend)
            .field("options", &self.options)
            .field("faces", &tables.faces.len())
            .field("sizes", &tables.sizes.len())
            .field("size_bytes", &tables.size_bytes)
            .finish_non_exhaustive()
    }
}

impl FaceCache {
    /// Creates a cache with default limits.
    pub fn new(backend: Arc<dyn FontBackend>) -> Self {
        Self::with_options(backend, FaceCacheOptions::default())
    }

    /// Creates a cache with the given limits.
    pub fn with_options(backend: Arc<dyn FontBackend>, options: FaceCacheOptions) -> Self {
        Self {
            backend,
            options,
            io_lock: Mutex::new(()),
            tables: RwLock::new(Tables {
                faces: Slots::new(),
                sizes: Slots::new(),
                size_bytes: 0,
            }),
            clock: AtomicU64::new(0),
            charmap: Mutex::new(HashMap::new()),
        }
    }

    /// The backend faces are opened with.
    pub fn backend(&self) -> &Arc<dyn FontBackend> {
        &self.backend
    }

    /// The cache's limits.
    pub fn options(&self) -> &FaceCacheOptions {
        &self.options
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the face for `face_ref` if it is still cached.
    pub fn get_face(&self, face_ref: FaceRef) -> Option<Arc<dyn FontFace>> {
        let tables = self.tables.read();
        let entry = tables.faces.get(face_ref.0)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(Arc::clone(&entry.face))
    }

    fn lookup_face(&self, id: FontId) -> Option<(FaceRef, Arc<dyn FontFace>)> {
        let tables = self.tables.read();
        let (slot_ref, entry) = tables.faces.find(|entry| entry.id == id)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some((FaceRef(slot_ref), Arc::clone(&entry.face)))
    }

    /// Resolves the face of font `id`, opening it from `source` if needed.
    ///
    /// `hint` is the reference the font last observed; when it is still live
    /// no search happens.
    pub fn resolve_face(
        &self,
        id: FontId,
        source: &FontSource,
        hint: Option<FaceRef>,
    ) -> Result<FaceLease, Error> {
        if let Some(face_ref) = hint {
            if let Some(face) = self.get_face(face_ref) {
                return Ok(FaceLease {
                    face_ref,
                    face,
                    opened: None,
                });
            }
        }
        if let Some((face_ref, face)) = self.lookup_face(id) {
            return Ok(FaceLease {
                face_ref,
                face,
                opened: None,
            });
        }

        let _io = self.io_lock.lock();
        // Another thread may have opened it while we waited.
        if let Some((face_ref, face)) = self.lookup_face(id) {
            return Ok(FaceLease {
                face_ref,
                face,
                opened: None,
            });
        }
        let (face, info) = open_face(&*self.backend, source)?;
        let face: Arc<dyn FontFace> = Arc::from(face);

        let mut evicted = Vec::new();
        let face_ref = {
            let mut tables = self.tables.write();
            while tables.faces.len() >= self.options.max_faces.max(1) {
                let Some(lru) = least_recent(&tables.faces) else {
                    break;
                };
                if let Some(entry) = tables.faces.remove(lru) {
                    log::debug!("evicting face of font {:?}", entry.id);
                    let sizes = tables.sizes.remove_where(|size| size.id == entry.id);
                    tables.size_bytes -= sizes.iter().map(|size| size.cost).sum::<usize>();
                    evicted.push(entry);
                }
            }
            FaceRef(tables.faces.insert(FaceEntry {
                id,
                face: Arc::clone(&face),
                last_used: AtomicU64::new(self.tick()),
            }))
        };
        // Backend objects are released while the io lock is still held.
        drop(evicted);
        Ok(FaceLease {
            face_ref,
            face,
            opened: Some(info),
        })
    }

    /// Returns the metrics for `size_ref` if they are still cached.
    pub fn get_size(&self, size_ref: SizeRef) -> Option<SizeMetrics> {
        let tables = self.tables.read();
        let entry = tables.sizes.get(size_ref.0)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some(entry.metrics)
    }

    fn lookup_size(&self, id: FontId, size: F26Dot6) -> Option<(SizeRef, SizeMetrics)> {
        let tables = self.tables.read();
        let (slot_ref, entry) = tables
            .sizes
            .find(|entry| entry.id == id && entry.size == size)?;
        entry.last_used.store(self.tick(), Ordering::Relaxed);
        Some((SizeRef(slot_ref), entry.metrics))
    }

    /// Resolves the scaled metrics of font `id` at `size` points.
    ///
    /// A failure here means the backend could not scale a face it opened;
    /// callers treat it as an internal error.
    pub fn resolve_size(
        &self,
        id: FontId,
        face: &dyn FontFace,
        size: F26Dot6,
        hint: Option<SizeRef>,
    ) -> Result<(SizeRef, SizeMetrics), Error> {
        if let Some(size_ref) = hint {
            if let Some(metrics) = self.get_size(size_ref) {
                if metrics.size == size {
                    return Ok((size_ref, metrics));
                }
            }
        }
        if let Some(found) = self.lookup_size(id, size) {
            return Ok(found);
        }

        let _io = self.io_lock.lock();
        if let Some(found) = self.lookup_size(id, size) {
            return Ok(found);
        }
        let metrics = SizeMetrics::new(&face.design_metrics(), size, self.options.dpi)?;
        let cost = face.size_cost();

        let mut tables = self.tables.write();
        while tables.sizes.len() >= self.options.max_sizes.max(1)
            || (tables.sizes.len() > 0 && tables.size_bytes + cost > self.options.max_bytes)
        {
            let Some(lru) = least_recent(&tables.sizes) else {
                break;
            };
            if let Some(entry) = tables.sizes.remove(lru) {
                log::debug!("evicting size {:?} of font {:?}", entry.size, entry.id);
                tables.size_bytes -= entry.cost;
            }
        }
        tables.size_bytes += cost;
        let size_ref = SizeRef(tables.sizes.insert(SizeEntry {
            id,
            size,
            metrics,
            cost,
            last_used: AtomicU64::new(self.tick()),
        }));
        Ok((size_ref, metrics))
    }

    /// Maps `codepoint` to a glyph index of font `id`, caching the answer.
    pub fn glyph_index(&self, id: FontId, face: &dyn FontFace, codepoint: u32) -> u32 {
        let mut charmap = self.charmap.lock();
        if let Some(&index) = charmap.get(&(id, codepoint)) {
            return index;
        }
        let index = face.glyph_index(codepoint);
        if charmap.len() >= self.options.max_charmap_entries {
            charmap.clear();
        }
        charmap.insert((id, codepoint), index);
        index
    }

    /// Drops every face, size and char-map entry belonging to font `id`.
    pub fn remove_font(&self, id: FontId) {
        let _io = self.io_lock.lock();
        let faces = {
            let mut tables = self.tables.write();
            let sizes = tables.sizes.remove_where(|size| size.id == id);
            tables.size_bytes -= sizes.iter().map(|size| size.cost).sum::<usize>();
            tables.faces.remove_where(|face| face.id == id)
        };
        drop(faces);
        self.charmap.lock().retain(|&(font, _), _| font != id);
    }

    /// Number of open faces.
    pub fn face_count(&self) -> usize {
        self.tables.read().faces.len()
    }

    /// Number of cached sizes.
    pub fn size_count(&self) -> usize {
        self.tables.read().sizes.len()
    }

    /// Bytes charged against the size budget.
    pub fn size_bytes(&self) -> usize {
        self.tables.read().size_bytes
    }
}

/// Opens a face and prepares it for use by the engine.
///
/// Rejects faces without scalable outlines, selects a Unicode, then Apple
/// Roman, then the first available character map, and attaches an auxiliary
/// metrics file found next to a path backed font. Failure to attach is logged
/// and otherwise ignored.
pub fn open_face(
    backend: &dyn FontBackend,
    source: &FontSource,
) -> Result<(Box<dyn FontFace>, FaceInfo), Error> {
    let mut face = backend.open(source)?;
    let info = face.info();
    if !info.flags.contains(FaceFlags::SCALABLE) {
        return Err(Error::new(ErrorKind::NotScalable).with_font(source.name()));
    }

    let selected = [CharMapEncoding::Unicode, CharMapEncoding::AppleRoman]
        .into_iter()
        .find(|&encoding| face.select_charmap(encoding))
        .or_else(|| {
            let first = face.charmaps().first().copied()?;
            face.select_charmap(first).then_some(first)
        });
    if selected.is_none() {
        return Err(Error::new(ErrorKind::NoUsableCharMap).with_font(source.name()));
    }

    if let Err(err) = attach_sidecar(&mut *face, source) {
        log::warn!("{err}");
    }
    Ok((face, info))
}

/// Attaches the auxiliary metrics file found next to a path backed font.
fn attach_sidecar(face: &mut dyn FontFace, source: &FontSource) -> Result<(), Error> {
    let Some(sidecar) = source.path().and_then(metrics_sidecar) else {
        return Ok(());
    };
    face.attach_metrics(&sidecar).map_err(|err| {
        Error::new(ErrorKind::AttachMetrics)
            .with_font(source.name())
            .with_detail(format!("{}: {err}", sidecar.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DesignMetrics, RasterRequest, RasterizedGlyph};
    use core::sync::atomic::AtomicUsize;

    #[derive(Debug, Default)]
    struct CountingBackend {
        opens: AtomicUsize,
        lookups: Arc<AtomicUsize>,
        scalable: bool,
        charmaps: Vec<CharMapEncoding>,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                scalable: true,
                charmaps: vec![CharMapEncoding::Unicode],
                ..Self::default()
            }
        }
    }

    #[derive(Debug)]
    struct TestFace {
        charmaps: Vec<CharMapEncoding>,
        scalable: bool,
        lookups: Arc<AtomicUsize>,
    }

    impl FontBackend for CountingBackend {
        fn open(&self, _source: &FontSource) -> Result<Box<dyn FontFace>, Error> {
            self.opens.fetch_add(1, Ordering::Relaxed);
            Ok(Box::new(TestFace {
                charmaps: self.charmaps.clone(),
                scalable: self.scalable,
                lookups: Arc::clone(&self.lookups),
            }))
        }
    }

    impl FontFace for TestFace {
        fn info(&self) -> FaceInfo {
            let mut info = FaceInfo::default();
            info.flags.set(FaceFlags::SCALABLE, self.scalable);
            info
        }

        fn charmaps(&self) -> &[CharMapEncoding] {
            &self.charmaps
        }

        fn select_charmap(&mut self, encoding: CharMapEncoding) -> bool {
            self.charmaps.contains(&encoding)
        }

        fn glyph_index(&self, codepoint: u32) -> u32 {
            self.lookups.fetch_add(1, Ordering::Relaxed);
            codepoint + 1
        }

        fn kerning(&self, _left: u32, _right: u32) -> i32 {
            0
        }

        fn design_metrics(&self) -> DesignMetrics {
            DesignMetrics {
                units_per_em: 1000,
                ascender: 800,
                descender: -200,
                height: 1000,
                max_advance: 600,
            }
        }

        fn rasterize(&self, _request: &RasterRequest) -> Option<RasterizedGlyph> {
            None
        }

        fn size_cost(&self) -> usize {
            100
        }
    }

    fn source(name: &str) -> FontSource {
        FontSource::from_memory(name, vec![0_u8; 4])
    }

    fn cache(
        backend: CountingBackend,
        options: FaceCacheOptions,
    ) -> (Arc<CountingBackend>, FaceCache) {
        let backend = Arc::new(backend);
        let cache = FaceCache::with_options(backend.clone(), options);
        (backend, cache)
    }

    #[test]
    fn reuses_open_faces() {
        let (backend, cache) = cache(CountingBackend::new(), FaceCacheOptions::default());
        let id = FontId::new();
        let first = cache.resolve_face(id, &source("a"), None).unwrap();
        assert!(first.opened.is_some());
        let again = cache
            .resolve_face(id, &source("a"), Some(first.face_ref))
            .unwrap();
        assert!(again.opened.is_none());
        assert_eq!(again.face_ref, first.face_ref);
        let by_id = cache.resolve_face(id, &source("a"), None).unwrap();
        assert_eq!(by_id.face_ref, first.face_ref);
        assert_eq!(backend.opens.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn evicts_least_recently_used_face() {
        let options = FaceCacheOptions {
            max_faces: 2,
            ..FaceCacheOptions::default()
        };
        let (backend, cache) = cache(CountingBackend::new(), options);
        let ids = [FontId::new(), FontId::new(), FontId::new()];
        let refs: Vec<_> = ids
            .iter()
            .map(|&id| cache.resolve_face(id, &source("f"), None).unwrap().face_ref)
            .collect();
        assert_eq!(cache.face_count(), 2);
        assert!(cache.get_face(refs[0]).is_none());
        assert!(cache.get_face(refs[1]).is_some());
        assert!(cache.get_face(refs[2]).is_some());

        // The stale font reopens transparently.
        let reopened = cache.resolve_face(ids[0], &source("f"), Some(refs[0])).unwrap();
        assert!(reopened.opened.is_some());
        assert_ne!(reopened.face_ref, refs[0]);
        assert_eq!(backend.opens.load(Ordering::Relaxed), 4);
        // `refs[1]` was the least recently used at that point.
        assert!(cache.get_face(refs[1]).is_none());
    }

    #[test]
    fn sizes_obey_count_and_byte_budget() {
        let options = FaceCacheOptions {
            max_sizes: 3,
            max_bytes: 250,
            ..FaceCacheOptions::default()
        };
        let (_, cache) = cache(CountingBackend::new(), options);
        let id = FontId::new();
        let face = cache.resolve_face(id, &source("a"), None).unwrap().face;
        let (small, metrics) = cache
            .resolve_size(id, &*face, F26Dot6::from_int(10), None)
            .unwrap();
        assert_eq!(metrics.x_ppem, 10);
        cache
            .resolve_size(id, &*face, F26Dot6::from_int(12), None)
            .unwrap();
        assert_eq!(cache.size_bytes(), 200);
        // A third size exceeds the byte budget before the count limit.
        cache
            .resolve_size(id, &*face, F26Dot6::from_int(14), None)
            .unwrap();
        assert_eq!(cache.size_count(), 2);
        assert_eq!(cache.size_bytes(), 200);
        assert!(cache.get_size(small).is_none());
    }

    #[test]
    fn stale_size_hint_for_other_size_is_ignored() {
        let (_, cache) = cache(CountingBackend::new(), FaceCacheOptions::default());
        let id = FontId::new();
        let face = cache.resolve_face(id, &source("a"), None).unwrap().face;
        let (ten, _) = cache
            .resolve_size(id, &*face, F26Dot6::from_int(10), None)
            .unwrap();
        let (_, metrics) = cache
            .resolve_size(id, &*face, F26Dot6::from_int(20), Some(ten))
            .unwrap();
        assert_eq!(metrics.size, F26Dot6::from_int(20));
    }

    #[test]
    fn evicting_a_face_drops_its_sizes() {
        let options = FaceCacheOptions {
            max_faces: 1,
            ..FaceCacheOptions::default()
        };
        let (_, cache) = cache(CountingBackend::new(), options);
        let a = FontId::new();
        let face = cache.resolve_face(a, &source("a"), None).unwrap().face;
        cache
            .resolve_size(a, &*face, F26Dot6::from_int(10), None)
            .unwrap();
        cache.resolve_face(FontId::new(), &source("b"), None).unwrap();
        assert_eq!(cache.size_count(), 0);
        assert_eq!(cache.size_bytes(), 0);
    }

    #[test]
    fn open_failures() {
        let backend = CountingBackend {
            scalable: false,
            ..CountingBackend::new()
        };
        let err = open_face(&backend, &source("bitmap")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotScalable);

        let backend = CountingBackend {
            charmaps: Vec::new(),
            ..CountingBackend::new()
        };
        let err = open_face(&backend, &source("nocmap")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoUsableCharMap);

        let backend = CountingBackend {
            charmaps: vec![CharMapEncoding::Other {
                platform: 3,
                encoding: 2,
            }],
            ..CountingBackend::new()
        };
        assert!(open_face(&backend, &source("other")).is_ok());
    }

    #[test]
    fn charmap_cache_and_removal() {
        let (backend, cache) = cache(CountingBackend::new(), FaceCacheOptions::default());
        let id = FontId::new();
        let face = cache.resolve_face(id, &source("a"), None).unwrap().face;
        assert_eq!(cache.glyph_index(id, &*face, 65), 66);
        assert_eq!(cache.glyph_index(id, &*face, 65), 66);
        assert_eq!(backend.lookups.load(Ordering::Relaxed), 1);
        cache
            .resolve_size(id, &*face, F26Dot6::from_int(10), None)
            .unwrap();

        cache.remove_font(id);
        assert_eq!(cache.face_count(), 0);
        assert_eq!(cache.size_count(), 0);
        assert_eq!(cache.glyph_index(id, &*face, 65), 66);
        assert_eq!(backend.lookups.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn sidecar_failures_are_reported_as_attach_errors() {
        let mut face = CountingBackend::new().open(&source("a")).unwrap();
        assert_eq!(
            attach_sidecar(&mut *face, &source("a")),
            Ok(()),
            "memory fonts have no sidecar"
        );

        let name = format!("quill-attach-{}", FontId::new().to_u64());
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("font.afm"), b"afm").unwrap();
        let type1 = FontSource::from_path(dir.join("font.pfb"));
        let err = attach_sidecar(&mut *face, &type1).unwrap_err();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(err.kind(), ErrorKind::AttachMetrics);
        assert!(!err.is_permanent());
        assert!(err.detail().unwrap().contains("font.afm"), "{err}");
        assert!(err.detail().unwrap().contains("not supported"), "{err}");
    }
}
