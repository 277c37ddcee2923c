use std::{
    any::Any,
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use crate::{
    component::Component,
    errors::InjectError,
    resolver::{Resolved, ServiceResolver},
    types::{Identity, Instance, Services},
};

/// How collection members take part in cycle detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollectionTracking {
    /// The resolved collection is visited as one unit, its elements are enqueued only the first
    /// time the collection itself is seen.
    ///
    /// A resolver handing out a fresh collection on every call gets its elements walked again.
    #[default]
    PerCollection,
    /// Every element is visited on its own, like single value members
    PerElement,
}

/// Walks an object graph breadth first and injects every autowired member
///
/// ```ignore
/// GraphResolver::new()
///     .collection_tracking(CollectionTracking::PerElement)
///     .resolve(&provider, &controller)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraphResolver {
    collection_tracking: CollectionTracking,
}

impl GraphResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection_tracking(mut self, tracking: CollectionTracking) -> Self {
        self.collection_tracking = tracking;
        self
    }

    /// Injects `root` and everything reachable from it
    ///
    /// Stops at the first single value member the resolver can not satisfy. Members assigned up to
    /// that point are left in place.
    pub fn resolve<R: ServiceResolver + ?Sized>(
        &self,
        resolver: &R,
        root: &dyn Component,
    ) -> Result<(), InjectError> {
        let root_info = root.type_info();
        tracing::debug!("Autowiring object graph of {}", root_info);

        let mut visited = VisitedSet::default();
        let mut pending = VecDeque::new();
        visited.insert_root(root);
        pending.push_back(Pending::Root(root));

        let mut objects = 0;
        let mut assigned = 0;
        while let Some(next) = pending.pop_front() {
            let object = next.component();
            let object_info = object.type_info();
            objects += 1;

            for target in object.injection_targets().iter() {
                if target.is_collection {
                    let services = resolver.resolve_all(target.target_type);
                    tracing::trace!(
                        "Injecting {} instances of {} into {}::{}",
                        services.len(),
                        target.target_type,
                        object_info,
                        target.member
                    );
                    target.assign(object, &Resolved::All(services.clone()))?;

                    match self.collection_tracking {
                        CollectionTracking::PerCollection => {
                            if visited.insert_collection(&services) {
                                pending.extend(services.iter().map(Pending::from_instance));
                            }
                        }
                        CollectionTracking::PerElement => {
                            for instance in &services {
                                if visited.insert_instance(instance) {
                                    pending.push_back(Pending::from_instance(instance));
                                }
                            }
                        }
                    }
                } else {
                    let Some(instance) = resolver.resolve_one(target.target_type) else {
                        tracing::error!(
                            "Unable to resolve {} for {}::{}",
                            target.target_type,
                            object_info,
                            target.member
                        );
                        return Err(InjectError::UnresolvedDependency {
                            dependency: target.target_type,
                            required_by: target.declaring_type,
                            member: target.member,
                        });
                    };

                    tracing::trace!(
                        "Injecting {} into {}::{}",
                        instance.info,
                        object_info,
                        target.member
                    );
                    target.assign(object, &Resolved::One(instance.clone()))?;

                    if visited.insert_instance(&instance) {
                        pending.push_back(Pending::from_instance(&instance));
                    }
                }
                assigned += 1;
            }
        }

        tracing::debug!(
            "Autowired {} objects ({} members) of {}",
            objects,
            assigned,
            root_info
        );
        Ok(())
    }
}

/// An object waiting to have its members injected
enum Pending<'a> {
    Root(&'a dyn Component),
    Resolved(Arc<dyn Component>),
}
impl Pending<'_> {
    fn from_instance(instance: &Instance) -> Self {
        Pending::Resolved(instance.component().clone())
    }

    fn component(&self) -> &dyn Component {
        match self {
            Pending::Root(root) => *root,
            Pending::Resolved(component) => component.as_ref(),
        }
    }
}

/// Objects and collections seen during one resolve call
#[derive(Default)]
struct VisitedSet {
    seen: HashSet<Identity>,
    /// Keeps every visited allocation alive, so an address can not be reused while resolving
    _retained: Vec<Box<dyn Any>>,
}
impl VisitedSet {
    fn insert_root(&mut self, root: &dyn Component) {
        self.seen.insert(Identity::of(root));
    }

    fn insert_instance(&mut self, instance: &Instance) -> bool {
        self.insert(instance.identity(), instance.component())
    }

    fn insert_collection(&mut self, services: &Services) -> bool {
        self.insert(services.identity(), services.shared())
    }

    /// Returns true if `identity` was not seen before
    fn insert<T: ?Sized + 'static>(&mut self, identity: Identity, shared: &Arc<T>) -> bool {
        if !self.seen.insert(identity) {
            return false;
        }
        self._retained.push(Box::new(shared.clone()));
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use mockall::predicate::eq;

    use super::*;
    use crate::{
        component::{Autowire, Autowired},
        inspector::Members,
        resolver::MockServiceResolver,
        types::TypeInfo,
    };

    trait Foo: Send + Sync {}
    trait Bar: Send + Sync {}

    #[derive(Default)]
    struct FooImpl;
    impl Autowire for FooImpl {}
    impl Foo for FooImpl {}

    #[derive(Default)]
    struct BarImpl;
    impl Autowire for BarImpl {}
    impl Bar for BarImpl {}

    #[derive(Default)]
    struct Root {
        svc: Autowired<Arc<dyn Foo>>,
        list: Autowired<Vec<Arc<dyn Bar>>>,
    }
    impl Autowire for Root {
        fn autowire(members: &mut Members<Self>) {
            members
                .autowire("svc", |r| &r.svc)
                .autowire("list", |r| &r.list);
        }
    }

    fn foo_instance(foo: &Arc<FooImpl>) -> Instance {
        Instance::aliased(foo.clone(), |foo| foo as Arc<dyn Foo>)
    }

    fn bar_instance(bar: &Arc<BarImpl>) -> Instance {
        Instance::aliased(bar.clone(), |bar| bar as Arc<dyn Bar>)
    }

    fn same<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
        Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
    }

    #[test]
    fn wires_single_and_collection_members() {
        let foo = Arc::new(FooImpl);
        let bars = vec![Arc::new(BarImpl), Arc::new(BarImpl)];

        let mut resolver = MockServiceResolver::new();
        let foo_resolved = foo_instance(&foo);
        resolver
            .expect_resolve_one()
            .with(eq(TypeInfo::of::<dyn Foo>()))
            .times(1)
            .returning(move |_| Some(foo_resolved.clone()));
        let bars_resolved: Services = bars.iter().map(bar_instance).collect();
        resolver
            .expect_resolve_all()
            .with(eq(TypeInfo::of::<dyn Bar>()))
            .times(1)
            .returning(move |_| bars_resolved.clone());

        let root = Root::default();
        GraphResolver::new().resolve(&resolver, &root).unwrap();

        assert!(same(&root.svc.get(), &foo));
        let list = root.list.get();
        assert_eq!(list.len(), 2);
        assert!(same(&list[0], &bars[0]));
        assert!(same(&list[1], &bars[1]));
    }

    #[test]
    fn empty_collection_is_assigned() {
        let foo = Arc::new(FooImpl);
        let mut resolver = MockServiceResolver::new();
        resolver
            .expect_resolve_one()
            .returning(move |_| Some(foo_instance(&foo)));
        resolver
            .expect_resolve_all()
            .times(1)
            .returning(|_| Services::default());

        let root = Root::default();
        GraphResolver::new().resolve(&resolver, &root).unwrap();

        assert!(root.list.is_wired());
        assert!(root.list.get().is_empty());
    }

    #[test]
    fn missing_single_dependency_aborts() {
        let mut resolver = MockServiceResolver::new();
        resolver
            .expect_resolve_one()
            .with(eq(TypeInfo::of::<dyn Foo>()))
            .times(1)
            .returning(|_| None);
        resolver.expect_resolve_all().never();

        let root = Root::default();
        let err = GraphResolver::new().resolve(&resolver, &root).unwrap_err();

        match err {
            InjectError::UnresolvedDependency {
                dependency,
                required_by,
                member,
            } => {
                assert_eq!(dependency, TypeInfo::of::<dyn Foo>());
                assert_eq!(required_by, TypeInfo::of::<Root>());
                assert_eq!(member, "svc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!root.svc.is_wired());
        assert!(!root.list.is_wired());
    }

    #[test]
    fn resolver_handing_out_the_wrong_type_fails() {
        let bar = Arc::new(BarImpl);
        let mut resolver = MockServiceResolver::new();
        resolver
            .expect_resolve_one()
            .returning(move |_| Some(bar_instance(&bar)));

        let root = Root::default();
        let err = GraphResolver::new().resolve(&resolver, &root).unwrap_err();
        assert!(matches!(err, InjectError::DowncastFailed { .. }));
    }

    // A <-> B cycle
    #[derive(Default)]
    struct A {
        b: Autowired<Arc<B>>,
    }
    impl Autowire for A {
        fn autowire(members: &mut Members<Self>) {
            members.autowire("b", |a| &a.b);
        }
    }

    #[derive(Default)]
    struct B {
        a: Autowired<Arc<A>>,
    }
    impl Autowire for B {
        fn autowire(members: &mut Members<Self>) {
            members.autowire("a", |b| &b.a);
        }
    }

    #[test]
    fn cycle_is_walked_once() {
        let a = Arc::new(A::default());
        let b = Arc::new(B::default());

        let mut resolver = MockServiceResolver::new();
        let b_resolved = Instance::new(b.clone());
        resolver
            .expect_resolve_one()
            .with(eq(TypeInfo::of::<B>()))
            .times(1)
            .returning(move |_| Some(b_resolved.clone()));
        let a_resolved = Instance::new(a.clone());
        resolver
            .expect_resolve_one()
            .with(eq(TypeInfo::of::<A>()))
            .times(1)
            .returning(move |_| Some(a_resolved.clone()));

        GraphResolver::new().resolve(&resolver, &*a).unwrap();

        assert!(same(&a.b.get(), &b));
        assert!(same(&b.a.get(), &a));
    }

    // Collection cycle: Hub holds all Spokes, every Spoke holds the Hub
    #[derive(Default)]
    struct Hub {
        spokes: Autowired<Vec<Arc<Spoke>>>,
    }
    impl Autowire for Hub {
        fn autowire(members: &mut Members<Self>) {
            members.autowire("spokes", |h| &h.spokes);
        }
    }

    #[derive(Default)]
    struct Spoke {
        hub: Autowired<Arc<Hub>>,
    }
    impl Autowire for Spoke {
        fn autowire(members: &mut Members<Self>) {
            members.autowire("hub", |s| &s.hub);
        }
    }

    struct HubCalls {
        resolve_one: Arc<AtomicUsize>,
        resolve_all: Arc<AtomicUsize>,
    }

    fn hub_resolver(
        hub: &Arc<Hub>,
        spokes: &[Arc<Spoke>],
        fresh_collections: bool,
    ) -> (MockServiceResolver, HubCalls) {
        let calls = HubCalls {
            resolve_one: Arc::new(AtomicUsize::new(0)),
            resolve_all: Arc::new(AtomicUsize::new(0)),
        };
        let mut resolver = MockServiceResolver::new();

        let hub_resolved = Instance::new(hub.clone());
        let counter = calls.resolve_one.clone();
        resolver
            .expect_resolve_one()
            .with(eq(TypeInfo::of::<Hub>()))
            .returning(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(hub_resolved.clone())
            });

        let spokes: Vec<Instance> = spokes.iter().cloned().map(Instance::new).collect();
        let stable = Services::new(spokes.clone());
        let counter = calls.resolve_all.clone();
        resolver
            .expect_resolve_all()
            .with(eq(TypeInfo::of::<Spoke>()))
            .returning(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                if fresh_collections {
                    Services::new(spokes.clone())
                } else {
                    stable.clone()
                }
            });
        (resolver, calls)
    }

    #[test]
    fn stable_collection_is_walked_once() {
        let hub = Arc::new(Hub::default());
        let spokes = vec![Arc::new(Spoke::default()), Arc::new(Spoke::default())];
        let (resolver, calls) = hub_resolver(&hub, &spokes, false);

        GraphResolver::new().resolve(&resolver, &*hub).unwrap();

        // Exactly one lookup per (object, member)
        assert_eq!(calls.resolve_all.load(Ordering::SeqCst), 1);
        assert_eq!(calls.resolve_one.load(Ordering::SeqCst), 2);
        assert_eq!(hub.spokes.get().len(), 2);
        for spoke in &spokes {
            assert!(same(&spoke.hub.get(), &hub));
        }
    }

    #[test]
    fn fresh_collection_elements_are_walked_again() {
        let hub = Arc::new(Hub::default());
        let spokes = vec![Arc::new(Spoke::default())];
        let (resolver, calls) = hub_resolver(&hub, &spokes, true);

        // root -> [spoke] -> hub -> new [spoke] -> spoke again -> hub already seen
        let root = Hub::default();
        GraphResolver::new().resolve(&resolver, &root).unwrap();

        assert_eq!(calls.resolve_all.load(Ordering::SeqCst), 2);
        assert_eq!(calls.resolve_one.load(Ordering::SeqCst), 2);
        assert!(same(&spokes[0].hub.get(), &hub));
    }

    #[test]
    fn per_element_tracking_skips_seen_elements() {
        let hub = Arc::new(Hub::default());
        let spokes = vec![Arc::new(Spoke::default())];
        let (resolver, calls) = hub_resolver(&hub, &spokes, true);

        // root -> [spoke] -> hub -> new [spoke], spoke already seen
        let root = Hub::default();
        GraphResolver::new()
            .collection_tracking(CollectionTracking::PerElement)
            .resolve(&resolver, &root)
            .unwrap();

        assert_eq!(calls.resolve_all.load(Ordering::SeqCst), 2);
        assert_eq!(calls.resolve_one.load(Ordering::SeqCst), 1);
        assert_eq!(root.spokes.get().len(), 1);
        assert_eq!(hub.spokes.get().len(), 1);
    }

    #[test]
    fn equal_values_in_distinct_allocations_are_distinct() {
        let first = Arc::new(FooImpl);
        let second = Arc::new(FooImpl);
        assert_ne!(Identity::of(&*first), Identity::of(&*second));
        assert_eq!(Identity::of(&*first), Instance::new(first.clone()).identity());
    }

    // Inner is the first field of Outer, so a borrowed Inner has the address of the Outer object
    #[repr(C)]
    #[derive(Default)]
    struct Outer {
        inner: Inner,
        foo: Autowired<Arc<dyn Foo>>,
    }
    impl Autowire for Outer {
        fn autowire(members: &mut Members<Self>) {
            members.autowire("foo", |o| &o.foo);
        }
    }

    #[derive(Default)]
    struct Inner {
        outer: Autowired<Arc<Outer>>,
    }
    impl Autowire for Inner {
        fn autowire(members: &mut Members<Self>) {
            members.autowire("outer", |i| &i.outer);
        }
    }

    #[test]
    fn object_sharing_an_address_with_the_root_is_still_walked() {
        let outer = Arc::new(Outer::default());
        assert_eq!(
            Arc::as_ptr(&outer) as *const (),
            &outer.inner as *const Inner as *const ()
        );
        assert_ne!(Identity::of(&*outer), Identity::of(&outer.inner));

        let foo = Arc::new(FooImpl);
        let mut resolver = MockServiceResolver::new();
        let outer_resolved = Instance::new(outer.clone());
        resolver
            .expect_resolve_one()
            .with(eq(TypeInfo::of::<Outer>()))
            .times(1)
            .returning(move |_| Some(outer_resolved.clone()));
        resolver
            .expect_resolve_one()
            .with(eq(TypeInfo::of::<dyn Foo>()))
            .times(1)
            .returning(move |_| Some(foo_instance(&foo)));

        GraphResolver::new().resolve(&resolver, &outer.inner).unwrap();

        assert!(same(&outer.inner.outer.get(), &outer));
        assert!(outer.foo.is_wired());
    }
}
