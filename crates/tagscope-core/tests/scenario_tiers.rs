//! # Scenario Tier Tests (T0-T4)
//!
//! End-to-end scenarios over a small paintings knowledge base.
//!
//! ## Tiers
//! - T0: Unsatisfied and absent tags
//! - T1: Containment modulo tags
//! - T2: Reconciliation through a view
//! - T3: Relation pairs
//! - T4: Persistent stores

use std::collections::BTreeSet;
use tagscope_core::{
    AspectView, Assertion, Clause, ContainmentOptions, Edit, EditOutcome, EngineConfig, EntityId,
    EntityKind, Fact, FactBody, FactKind, FactStore, FilterEngine, MemStore, PredicateSource,
    PropertyId, ReconcileEngine, RelationSelector, ScopeStack, Tag, TagPredicate, Term, contains,
    filter_entities, filter_relation,
};

const BASE: &str = "http://www.corporate-semantic-web.de/ontologies/aspect/owl/example/testpaintings";
const EL: &str = "http://www.corporate-semantic-web.de/ontologies/aspect/owl/complexity/example#OWLELComplexity";
const WIKIPEDIA: &str = "http://www.corporate-semantic-web.de/ontologies/aspect/owl/provenance/example#Wikipedia";
const SPIEGEL: &str = "http://www.corporate-semantic-web.de/ontologies/aspect/owl/provenance/example#Spiegel";
const YEARS_SINCE_1955: &str = "http://www.corporate-semantic-web.de/ontologies/aspect/owl/temporal/example#YearsSince1955";
const NONEXISTENT: &str = "http://www.corporate-semantic-web.de/ontologies/aspect/owl/provenance/example#ProvenanceAspect12345";
const TEMPORAL_NONEXISTENT: &str = "http://www.corporate-semantic-web.de/ontologies/aspect/owl/temporal/example#TemporalAspect12345";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn iri(local: &str) -> String {
    format!("{}#{}", BASE, local)
}

fn individual(local: &str) -> Fact {
    Fact::new(FactBody::declaration(
        EntityKind::NamedIndividual,
        EntityId::new(iri(local)),
    ))
}

fn located_in_germany() -> Fact {
    Fact::new(FactBody::Assertion(Assertion::object(
        Term::entity(iri("SistineMadonnaObj")),
        PropertyId::new(iri("hasLocationCountry")),
        Term::entity(iri("Germany")),
    )))
}

fn and(tags: &[&str]) -> TagPredicate {
    TagPredicate::all_of(tags.iter().copied())
}

fn or(clauses: &[&[&str]]) -> TagPredicate {
    TagPredicate::from_clauses(clauses.iter().map(|c| Clause::of(c.iter().copied())))
}

fn tags(iris: &[&str]) -> BTreeSet<Tag> {
    iris.iter().map(|t| Tag::new(*t)).collect()
}

fn engine() -> FilterEngine {
    FilterEngine::new(EngineConfig::new(false))
}

// =============================================================================
// TIER T0: UNSATISFIED AND ABSENT TAGS
// =============================================================================

mod t0_absent_tags {
    use super::*;

    fn twenty_individuals() -> (MemStore, BTreeSet<EntityId>) {
        let facts: Vec<Fact> = (0..20)
            .map(|i| individual(&format!("Painting{}", i)).with_tag(Tag::new(WIKIPEDIA)))
            .collect();
        let entities = facts
            .iter()
            .filter_map(|f| f.body().declared_entity().cloned())
            .collect();
        (MemStore::from_facts(facts), entities)
    }

    /// T0.1: An untagged fact is not contained under a conjunction.
    #[test]
    fn untagged_fact_not_contained() {
        let store = MemStore::from_facts([individual("Frauenbad")]);
        let p = and(&[EL, WIKIPEDIA]);

        assert!(
            !contains(&store, &individual("Frauenbad"), &p, ContainmentOptions::default())
                .expect("contains")
        );
    }

    /// T0.2: An entity declared only by an untagged fact is excluded.
    #[test]
    fn untagged_declaration_excludes_entity() {
        let store = MemStore::from_facts([individual("Frauenbad")]);
        let entities: BTreeSet<EntityId> = [EntityId::new(iri("Frauenbad"))].into_iter().collect();

        let result = filter_entities(&store, &entities, &and(&[EL, WIKIPEDIA])).expect("filter");
        assert!(result.is_empty());
    }

    /// T0.3: None of twenty entities survive a nonexistent aspect.
    #[test]
    fn nonexistent_aspect_excludes_all() {
        let (store, entities) = twenty_individuals();
        let result = filter_entities(&store, &entities, &and(&[NONEXISTENT])).expect("filter");
        assert_eq!(result.len(), 0);
    }

    /// T0.4: A disjunction with one existing aspect keeps all twenty.
    #[test]
    fn disjunction_with_existing_aspect_keeps_all() {
        let (store, entities) = twenty_individuals();
        let result = filter_entities(&store, &entities, &or(&[&[NONEXISTENT], &[WIKIPEDIA]]))
            .expect("filter");
        assert_eq!(result.len(), 20);
    }
}

// =============================================================================
// TIER T1: CONTAINMENT
// =============================================================================

mod t1_containment {
    use super::*;

    fn store() -> MemStore {
        MemStore::from_facts([located_in_germany().with_tags(tags(&[EL, WIKIPEDIA]))])
    }

    /// T1.1: Exact conjunction is contained.
    #[test]
    fn exact_conjunction() {
        assert!(
            contains(
                &store(),
                &located_in_germany(),
                &and(&[EL, WIKIPEDIA]),
                ContainmentOptions::default()
            )
            .expect("contains")
        );
    }

    /// T1.2: A conjunction naming a missing tag is not.
    #[test]
    fn conjunction_with_missing_tag() {
        assert!(
            !contains(
                &store(),
                &located_in_germany(),
                &and(&[EL, SPIEGEL]),
                ContainmentOptions::default()
            )
            .expect("contains")
        );
    }

    /// T1.3: A disjunction with one satisfied clause is.
    #[test]
    fn disjunction_with_one_satisfied_clause() {
        assert!(
            contains(
                &store(),
                &located_in_germany(),
                &or(&[&[EL, SPIEGEL], &[EL, WIKIPEDIA]]),
                ContainmentOptions::default()
            )
            .expect("contains")
        );
    }
}

// =============================================================================
// TIER T2: RECONCILIATION
// =============================================================================

mod t2_reconciliation {
    use super::*;

    fn count_under(store: &MemStore, p: &TagPredicate) -> usize {
        let scopes = ScopeStack::new();
        let view = AspectView::new(store.clone(), &scopes, engine());
        let _scope = scopes.enter(PredicateSource::Tags(p.clone()));
        view.count(false).expect("count")
    }

    /// T2.1: Count, re-add, strip, re-add.
    #[test]
    fn add_strip_readd_counts() {
        let p = and(&[WIKIPEDIA, YEARS_SINCE_1955]);
        let mut store =
            MemStore::from_facts([located_in_germany().with_tags(tags(&[WIKIPEDIA, YEARS_SINCE_1955]))]);
        assert_eq!(count_under(&store, &p), 1);

        let report = ReconcileEngine::new(&mut store).add(&located_in_germany(), &p);
        assert_eq!(report.outcome, EditOutcome::AlreadyTagged);
        assert_eq!(count_under(&store, &p), 1);

        ReconcileEngine::new(&mut store).remove(&located_in_germany(), &p);
        assert_eq!(count_under(&store, &p), 0);
        assert_eq!(store.len(), 1);

        ReconcileEngine::new(&mut store).add(&located_in_germany(), &p);
        assert_eq!(count_under(&store, &p), 1);
    }

    /// T2.2: The full modification sequence under a conjunction.
    #[test]
    fn modification_sequence_and() {
        init_tracing();
        let scopes = ScopeStack::new();
        let mut view = AspectView::new(
            MemStore::from_facts([located_in_germany().with_tags(tags(&[WIKIPEDIA, YEARS_SINCE_1955]))]),
            &scopes,
            engine(),
        );
        let _scope = scopes.enter(PredicateSource::Tags(and(&[WIKIPEDIA, YEARS_SINCE_1955])));
        let ax = located_in_germany();

        let count = view.count(false).expect("count");
        assert_eq!(count, 1);

        view.add(&ax).expect("add");
        assert_eq!(view.count(false).expect("count"), count);

        view.remove(&ax).expect("remove");
        assert_eq!(view.count(false).expect("count"), count - 1);

        view.apply_all(&[Edit::Add(ax.clone())]).expect("batch");
        assert_eq!(view.count(false).expect("count"), count);

        view.apply_all(&[Edit::Add(ax.clone())]).expect("batch");
        assert_eq!(view.count(false).expect("count"), count);

        view.apply_all(&[Edit::Remove(ax.clone())]).expect("batch");
        assert_eq!(view.count(false).expect("count"), count - 1);

        // Content survives every strip.
        assert_eq!(view.store().len(), 1);
    }

    /// T2.3: The full modification sequence under a disjunction.
    #[test]
    fn modification_sequence_or() {
        let scopes = ScopeStack::new();
        let mut view = AspectView::new(
            MemStore::from_facts([located_in_germany().with_tags(tags(&[WIKIPEDIA, YEARS_SINCE_1955]))]),
            &scopes,
            engine(),
        );
        let _scope = scopes.enter(PredicateSource::Tags(or(&[
            &[NONEXISTENT],
            &[TEMPORAL_NONEXISTENT],
        ])));
        let ax = located_in_germany();

        let count = view.count(false).expect("count");
        assert_eq!(count, 0);

        view.add(&ax).expect("add");
        assert_eq!(view.count(false).expect("count"), count + 1);

        let report = view.remove(&ax).expect("remove");
        assert_eq!(report.outcome, EditOutcome::Stripped);
        assert_eq!(view.count(false).expect("count"), count);

        view.apply_all(&[Edit::Add(ax.clone())]).expect("batch");
        assert_eq!(view.count(false).expect("count"), count + 1);

        view.apply_all(&[Edit::Add(ax.clone())]).expect("batch");
        assert_eq!(view.count(false).expect("count"), count + 1);

        view.apply_all(&[Edit::Remove(ax.clone())]).expect("batch");
        assert_eq!(view.count(false).expect("count"), count);

        // The stored tags survive the round trip.
        let held = view
            .store()
            .variant_of(&ax)
            .expect("variant")
            .expect("held");
        assert_eq!(held.tags(), &tags(&[WIKIPEDIA, YEARS_SINCE_1955]));
    }

    /// T2.4: Per-kind counts agree with filtering under a view.
    #[test]
    fn kind_counts_match_filtering() {
        let store = MemStore::from_facts([
            located_in_germany().with_tags(tags(&[EL, WIKIPEDIA])),
            individual("SistineMadonnaObj").with_tags(tags(&[EL, WIKIPEDIA])),
            individual("Germany").with_tag(Tag::new(SPIEGEL)),
        ]);
        let scopes = ScopeStack::new();
        let view = AspectView::new(store, &scopes, engine());
        let _scope = scopes.enter(PredicateSource::Tags(and(&[EL, WIKIPEDIA])));

        let facts = view.facts(false).expect("facts");
        assert_eq!(view.count(false).expect("count"), facts.len());
        assert_eq!(
            view.count_kind(&FactKind::ObjectPropertyAssertion, false)
                .expect("count"),
            1
        );
        assert_eq!(view.count_logical(false).expect("count"), 1);
    }
}

// =============================================================================
// TIER T3: RELATION PAIRS
// =============================================================================

mod t3_relations {
    use super::*;

    fn assertion(property: &str, object: &str, tag_iris: &[&str]) -> Fact {
        Fact::new(FactBody::Assertion(Assertion::object(
            Term::entity(iri("SistineMadonnaObj")),
            PropertyId::new(iri(property)),
            Term::entity(iri(object)),
        )))
        .with_tags(tags(tag_iris))
    }

    fn store() -> MemStore {
        MemStore::from_facts([
            assertion("hasLocationCountry", "Germany", &[WIKIPEDIA]),
            assertion("hasPainter", "Raphael", &[WIKIPEDIA]),
            assertion("hasMuseum", "Gemaeldegalerie", &[WIKIPEDIA, SPIEGEL]),
            assertion("hasStyle", "HighRenaissance", &[SPIEGEL]),
            assertion("hasOwner", "Dresden", &[SPIEGEL]),
        ])
    }

    /// T3.1: Three distinct properties qualify under the predicate.
    #[test]
    fn three_keys_under_predicate() {
        let result = filter_relation(
            &store(),
            &Term::entity(iri("SistineMadonnaObj")),
            RelationSelector::OBJECT,
            &and(&[WIKIPEDIA]),
        )
        .expect("relation");

        assert_eq!(result.len(), 3);
        assert!(result.values().all(|values| !values.is_empty()));
    }

    /// T3.2: No key qualifies under an unsatisfiable predicate.
    #[test]
    fn zero_keys_when_unsatisfiable() {
        let result = filter_relation(
            &store(),
            &Term::entity(iri("SistineMadonnaObj")),
            RelationSelector::OBJECT,
            &and(&[NONEXISTENT]),
        )
        .expect("relation");
        assert!(result.is_empty());
    }
}

// =============================================================================
// TIER T4: PERSISTENT STORES
// =============================================================================

mod t4_persistence {
    use super::*;
    use tagscope_core::{RedbFactStore, store_from_bytes, store_to_bytes};
    use tempfile::TempDir;

    /// T4.1: The reconciliation scenario holds on a redb store.
    #[test]
    fn reconciliation_on_redb() {
        let dir = TempDir::new().expect("create temp dir");
        let mut store = RedbFactStore::open(dir.path().join("facts.redb")).expect("open");
        let p = and(&[WIKIPEDIA, YEARS_SINCE_1955]);
        let counter = engine();

        ReconcileEngine::new(&mut store).add(&located_in_germany(), &p);
        assert_eq!(counter.filter_store(&store, false, &p).expect("filter").len(), 1);

        ReconcileEngine::new(&mut store).remove(&located_in_germany(), &p);
        assert_eq!(counter.filter_store(&store, false, &p).expect("filter").len(), 0);
        assert_eq!(store.fact_count().expect("count"), 1);
    }

    /// T4.2: A snapshot keeps tags and annotations apart.
    #[test]
    fn snapshot_preserves_view() {
        let store = MemStore::from_facts([
            located_in_germany().with_tags(tags(&[EL, WIKIPEDIA])),
            individual("Germany"),
        ]);
        let restored = store_from_bytes(&store_to_bytes(&store).expect("encode")).expect("decode");

        let p = and(&[EL]);
        assert_eq!(
            engine().filter_store(&restored, false, &p).expect("filter"),
            engine().filter_store(&store, false, &p).expect("filter")
        );
    }

    /// T4.3: Marker annotations become tags on ingestion.
    #[test]
    fn ingestion_through_configured_vocabulary() {
        use tagscope_core::Annotation;

        let config = EngineConfig::from_toml_str(
            r#"
            expand_modules = false

            [vocabulary]
            marker = "http://example.org/hasAspect"
            "#,
        )
        .expect("config");
        let fact = config.vocabulary.partition(
            located_in_germany().body().clone(),
            [
                Annotation::iri("http://example.org/hasAspect", WIKIPEDIA),
                Annotation::literal("http://www.w3.org/2000/01/rdf-schema#comment", "seen 2024"),
            ],
        );

        let dir = TempDir::new().expect("create temp dir");
        let mut store = RedbFactStore::open(dir.path().join("facts.redb")).expect("open");
        let imported = store
            .import_from(&MemStore::from_facts([fact.clone()]))
            .expect("import");
        assert_eq!(imported, 1);

        let filtered = FilterEngine::new(config)
            .filter_store(&store, false, &and(&[WIKIPEDIA]))
            .expect("filter");
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains(&fact));
        assert_eq!(fact.annotations().len(), 1);
    }

    /// T4.4: Cross-store filtering stays within its input and expands per store.
    #[test]
    fn cross_store_filtering_on_redb() {
        let painting_class = Fact::new(FactBody::axiom(
            "ClassAssertion",
            vec![Term::entity(iri("Painting")), Term::entity(iri("SistineMadonnaObj"))],
        ));
        let country_class = Fact::new(FactBody::axiom(
            "ClassAssertion",
            vec![Term::entity(iri("Country")), Term::entity(iri("Germany"))],
        ));

        let dir = TempDir::new().expect("create temp dir");
        let mut paintings = RedbFactStore::open(dir.path().join("paintings.redb")).expect("open");
        let mut places = RedbFactStore::open(dir.path().join("places.redb")).expect("open");
        paintings.insert(painting_class.clone()).expect("insert");
        places.insert(country_class.clone()).expect("insert");

        let candidates: BTreeSet<Fact> = [
            located_in_germany().with_tag(Tag::new(WIKIPEDIA)),
            individual("Frauenbad").with_tag(Tag::new(SPIEGEL)),
        ]
        .into_iter()
        .collect();
        let p = and(&[WIKIPEDIA]);

        let plain = engine()
            .filter_facts_across_stores([&paintings, &places], &candidates, &p)
            .expect("filter");
        assert!(plain.is_subset(&candidates));
        assert_eq!(plain.len(), 1);

        let expanded = FilterEngine::new(EngineConfig::new(true))
            .filter_facts_across_stores([&paintings, &places], &candidates, &p)
            .expect("filter");
        assert!(plain.is_subset(&expanded));
        assert!(expanded.contains(&painting_class));
        assert!(expanded.contains(&country_class));
        assert_eq!(expanded.len(), 3);
    }
}
