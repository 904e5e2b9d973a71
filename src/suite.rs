//! Conformance suite for [`DataStore`] implementations.
//!
//! [`register`] clears the store and registers save, query, update, delete,
//! observe and observe-query scenarios on the `BasicModel`, `Post` and
//! `Comment` models. Every test isolates its records by embedding its own
//! name and a fresh id into titles and bodies, so tests do not depend on each
//! other or on records left behind by earlier tests.
//!
//! Scenarios known not to hold for current clients are registered as skipped.

use std::future::Future;

use anyhow::Context;

use crate::{
    collect::{ObserveCollector, SnapshotCollector},
    datastore::{BasicModel, Comment, Criteria, DataStore, Model, OpType, Post, make_id},
    expect::expect,
    registry::Registry,
};

/// A registry paired with the store under test.
#[derive(Debug, Clone)]
pub struct Scope<S> {
    pub registry: Registry,
    pub store: S,
}

impl<S: DataStore + Clone + 'static> Scope<S> {
    pub async fn describe<F, Fut>(&self, name: &str, body: F) -> Fut::Output
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future,
    {
        let store = self.store.clone();
        self.registry
            .describe(name, |registry| body(Self { registry, store }))
            .await
    }

    pub fn describe_skip<F, Fut>(&self, name: &str, body: F)
    where
        F: FnOnce(Self) -> Fut,
        Fut: Future,
    {
        self.registry.describe_skip(name, body);
    }

    pub fn test<F, Fut>(&self, name: &str, body: F)
    where
        F: FnOnce(Self) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let scope = self.clone();
        self.registry.test(name, move || body(scope));
    }

    pub fn test_skip<F, Fut>(&self, name: &str, body: F)
    where
        F: FnOnce(Self) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.registry.test_skip(name, body);
    }

    /// Name of the running test.
    pub fn name(&self) -> String {
        self.registry.test_name()
    }

    /// The running test's name followed by a fresh id.
    fn isolated(&self) -> String {
        format!("{} - {}", self.name(), make_id())
    }
}

/// Clear `store` and register the whole suite on `registry`.
pub async fn register<S>(registry: &Registry, store: S) -> anyhow::Result<()>
where
    S: DataStore + Clone + 'static,
{
    store.clear().await.context("could not clear the store")?;

    let root = Scope {
        registry: registry.clone(),
        store,
    };
    root.describe("Sanity checks", |s| async move { sanity(&s) })
        .await;
    root.describe("Basic", |s| async move {
        s.describe("Save", |s| async move { save(&s) }).await;
        s.describe("Query", |s| async move { query(&s) }).await;
        s.describe("Update", |s| async move { update(&s) }).await;
        s.describe("Delete", |s| async move { delete(&s) }).await;
    })
    .await;
    root.describe("observe", |s| async move {
        s.describe("sanity checks", |s| async move { observe_basic(&s) })
            .await;
        s.describe("CPK models", |s| async move { observe_cpk(&s) })
            .await;
    })
    .await;
    root.describe("observeQuery", |s| async move {
        s.describe("sanity checks", |s| async move { observe_query_basic(&s) })
            .await;
        s.describe("CPK models", |s| async move { observe_query_cpk(&s) })
            .await;
    })
    .await;
    root.describe("Related entity stuff", |s| async move { related(&s) })
        .await;
    root.describe_skip("Expected error cases", |s| async move { expected_errors(&s) });

    Ok(())
}

fn sanity<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("test name is accessible", |cx| async move {
        expect(cx.name()).to_be_truthy()?;
        expect(cx.name()).to_equal("Sanity checks > test name is accessible")?;
        anyhow::Ok(())
    });
}

fn save<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("Can save a basic model", |cx| async move {
        let saved = cx.store.save(BasicModel::new(cx.name())).await?;
        expect(&saved).to_be_defined()?;
        expect(saved.id()).to_be_truthy()?;
        expect(saved.meta.created_at).to_be_defined()?;
        anyhow::Ok(())
    });

    s.test("can save a post (HAS_MANY parent) with an ID", |cx| async move {
        let post = cx.store.save(Post::new(make_id(), cx.name())).await?;
        expect(&post).to_be_defined()?;
        expect(&post.post_id).to_be_truthy()?;
        anyhow::Ok(())
    });

    s.test("can create a comment with an ID", |cx| async move {
        let comment = cx.store.save(Comment::new(make_id(), cx.name())).await?;
        expect(&comment).to_be_defined()?;
        expect(&comment.comment_id).to_be_truthy()?;
        anyhow::Ok(())
    });
}

fn query<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can retrieve a created post by PK", |cx| async move {
        let saved = cx.store.save(Post::new(make_id(), cx.name())).await?;
        let retrieved = cx
            .store
            .query_by_key::<Post>(saved.key())
            .await?
            .context("post not found")?;

        expect(&retrieved.post_id).to_equal(&saved.post_id)?;
        expect(&retrieved.title).to_equal(&saved.title)?;
        anyhow::Ok(())
    });

    s.test("can retrieve a created post by PK predicate", |cx| async move {
        let saved = cx.store.save(Post::new(make_id(), cx.name())).await?;
        let post_id = saved.post_id.clone();
        let retrieved = cx
            .store
            .query(Criteria::<Post>::matching(move |p| p.post_id == post_id))
            .await?
            .pop()
            .context("post not found")?;

        expect(&retrieved.post_id).to_equal(&saved.post_id)?;
        expect(&retrieved.title).to_equal(&saved.title)?;
        anyhow::Ok(())
    });

    s.test("can retrieve a created comment by PK", |cx| async move {
        let saved = cx.store.save(Comment::new(make_id(), cx.name())).await?;
        let retrieved = cx
            .store
            .query_by_key::<Comment>(saved.key())
            .await?
            .context("comment not found")?;

        expect(&retrieved.comment_id).to_equal(&saved.comment_id)?;
        expect(&retrieved.content).to_equal(&saved.content)?;
        anyhow::Ok(())
    });

    s.test("can retrieve a created comment by PK predicate", |cx| async move {
        let saved = cx.store.save(Comment::new(make_id(), cx.name())).await?;
        let comment_id = saved.comment_id.clone();
        let retrieved = cx
            .store
            .query(Criteria::<Comment>::matching(move |c| c.comment_id == comment_id))
            .await?
            .pop()
            .context("comment not found")?;

        expect(&retrieved.comment_id).to_equal(&saved.comment_id)?;
        expect(&retrieved.content).to_equal(&saved.content)?;
        anyhow::Ok(())
    });

    s.test("can retrieve all posts", |cx| async move {
        const POSTS: usize = 5;
        let prefix = cx.isolated();
        for idx in 0..POSTS {
            cx.store
                .save(Post::new(make_id(), format!("{prefix} - {idx}")))
                .await?;
        }

        let retrieved: Vec<_> = cx
            .store
            .query(Criteria::<Post>::all())
            .await?
            .into_iter()
            .filter(|p| p.title.starts_with(&prefix))
            .collect();
        expect(retrieved).to_have_length(POSTS)?;
        anyhow::Ok(())
    });
}

fn update<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can update basic model (sanity check)", |cx| async move {
        let saved = cx.store.save(BasicModel::new(cx.name())).await?;
        let retrieved = cx
            .store
            .query_by_key::<BasicModel>(saved.key())
            .await?
            .context("model not found")?;
        let updated = cx
            .store
            .save(retrieved.copy_of(|draft| draft.body.push_str(" - edited")))
            .await?;
        let retrieved_updated = cx
            .store
            .query_by_key::<BasicModel>(saved.key())
            .await?
            .context("updated model not found")?;

        let edited = format!("{} - edited", saved.body);
        expect(&updated.body).to_equal(&edited)?;
        expect(&retrieved_updated.body).to_equal(&edited)?;
        anyhow::Ok(())
    });

    s.test_skip("cannot update Post (HAS_ONE parent) SK", |cx| async move {
        let title = cx.isolated();
        let saved = cx.store.save(Post::new(make_id(), &title)).await?;
        let edited = saved.copy_of(|draft| draft.title = format!("{title} - edited"));
        expect(|| cx.store.save(edited)).rejects().to_throw().await?;
        anyhow::Ok(())
    });

    s.test_skip("cannot update Post (HAS_ONE parent) Cluster key", |cx| async move {
        let saved = cx.store.save(Post::new(make_id(), cx.isolated())).await?;
        let edited = saved.copy_of(|draft| draft.meta.id = make_id());
        expect(|| cx.store.save(edited)).rejects().to_throw().await?;
        anyhow::Ok(())
    });

    s.test("can update post on Comment (BELONGS_TO FK)", |cx| async move {
        let prefix = cx.isolated();
        let post_a = cx.store.save(Post::new(make_id(), format!("{prefix} - post A"))).await?;
        let post_b = cx.store.save(Post::new(make_id(), format!("{prefix} - post B"))).await?;
        let comment = cx
            .store
            .save(Comment::new(make_id(), format!("{prefix} - comment")).with_post(&post_a))
            .await?;

        let retrieved = cx
            .store
            .query_by_key::<Comment>(comment.key())
            .await?
            .context("comment not found")?;
        cx.store
            .save(retrieved.copy_of(|draft| draft.set_post(&post_b)))
            .await?;
        let retrieved_updated = cx.store.query_by_key::<Comment>(comment.key()).await?;

        expect(&retrieved_updated).to_be_defined()?;
        expect(retrieved_updated.and_then(|c| c.post_id)).to_equal(&post_b.post_id)?;
        anyhow::Ok(())
    });
}

fn delete<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can delete BasicModel by instance", |cx| async move {
        let item = cx.store.save(BasicModel::new(cx.isolated())).await?;
        let before = cx.store.query_by_key::<BasicModel>(item.key()).await?;
        cx.store.delete(Criteria::of(&item)).await?;
        let after = cx.store.query_by_key::<BasicModel>(item.key()).await?;

        expect(before).to_be_defined()?;
        expect(after).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete BasicModel by non-existent PK results in no error ", |cx| async move {
        let item = cx.store.save(BasicModel::new(cx.isolated())).await?;
        let before = cx.store.query_by_key::<BasicModel>(item.key()).await?;
        let deleted = cx
            .store
            .delete(Criteria::<BasicModel>::key("does not exist"))
            .await?;
        let after = cx.store.query_by_key::<BasicModel>(item.key()).await?;

        expect(before).to_be_defined()?;
        expect(after).to_be_defined()?;
        expect(deleted).to_equal(Vec::<BasicModel>::new())?;
        anyhow::Ok(())
    });

    s.test_skip("can delete BasicModel by bad PK results in meaningful error ", |cx| async move {
        cx.store.save(BasicModel::new(cx.isolated())).await?;
        expect(|| cx.store.delete(Criteria::<BasicModel>::key("")))
            .rejects()
            .to_throw()
            .await?;
        anyhow::Ok(())
    });

    s.test("can delete Post by instance", |cx| async move {
        let post = cx.store.save(Post::new(make_id(), format!("{} - post", cx.isolated()))).await?;
        cx.store.delete(Criteria::of(&post)).await?;
        let retrieved = cx.store.query_by_key::<Post>(post.key()).await?;
        expect(retrieved).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete Post by PK", |cx| async move {
        let post = cx.store.save(Post::new(make_id(), format!("{} - post", cx.isolated()))).await?;
        cx.store
            .delete(Criteria::<Post>::key((post.post_id.clone(), post.title.clone())))
            .await?;
        let retrieved = cx.store.query_by_key::<Post>(post.key()).await?;
        expect(retrieved).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete Post by PK predicate", |cx| async move {
        let post = cx.store.save(Post::new(make_id(), format!("{} - post", cx.isolated()))).await?;
        let key = post.key();
        cx.store
            .delete(Criteria::<Post>::matching(move |p| p.post_id == key.0 && p.title == key.1))
            .await?;
        let retrieved = cx.store.query_by_key::<Post>(post.key()).await?;
        expect(retrieved).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete Post by PK cluster key", |cx| async move {
        let post = cx.store.save(Post::new(make_id(), format!("{} - post", cx.isolated()))).await?;
        let post_id = post.post_id.clone();
        cx.store
            .delete(Criteria::<Post>::matching(move |p| p.post_id == post_id))
            .await?;
        let retrieved = cx.store.query_by_key::<Post>(post.key()).await?;
        expect(retrieved).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete Comment by instance", |cx| async move {
        let comment = cx
            .store
            .save(Comment::new(make_id(), format!("{} - comment", cx.isolated())))
            .await?;
        cx.store.delete(Criteria::of(&comment)).await?;
        let retrieved = cx.store.query_by_key::<Comment>(comment.key()).await?;
        expect(retrieved).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete Comment by PK cluster key", |cx| async move {
        let comment = cx
            .store
            .save(Comment::new(make_id(), format!("{} - comment", cx.isolated())))
            .await?;
        cx.store
            .delete(Criteria::<Comment>::key((
                comment.comment_id.clone(),
                comment.content.clone(),
            )))
            .await?;
        let retrieved = cx.store.query_by_key::<Comment>(comment.key()).await?;
        expect(retrieved).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete Comment by PK predicate", |cx| async move {
        let comment = cx
            .store
            .save(Comment::new(make_id(), format!("{} - comment", cx.isolated())))
            .await?;
        let key = comment.key();
        cx.store
            .delete(Criteria::<Comment>::matching(move |c| {
                c.comment_id == key.0 && c.content == key.1
            }))
            .await?;
        let retrieved = cx.store.query_by_key::<Comment>(comment.key()).await?;
        expect(retrieved).to_be_falsy()?;
        anyhow::Ok(())
    });

    s.test("can delete non-existent Comment without error", |cx| async move {
        let comment = cx
            .store
            .save(Comment::new(make_id(), format!("{} - comment", cx.isolated())))
            .await?;
        let deleted = cx
            .store
            .delete(Criteria::<Comment>::key((
                comment.comment_id.clone(),
                "does not exist".to_string(),
            )))
            .await?;
        let retrieved = cx.store.query_by_key::<Comment>(comment.key()).await?;

        expect(retrieved).to_be_defined()?;
        expect(deleted).to_equal(Vec::<Comment>::new())?;
        anyhow::Ok(())
    });

    s.test_skip(
        "attempting to deleting Comment with partial key error is meaningful",
        |cx| async move {
            let comment = cx
                .store
                .save(Comment::new(make_id(), format!("{} - comment", cx.isolated())))
                .await?;
            let comment_id = comment.comment_id.clone();
            expect(|| {
                cx.store
                    .delete(Criteria::<Comment>::matching(move |c| c.comment_id == comment_id))
            })
            .rejects()
            .to_throw()
            .await?;
            anyhow::Ok(())
        },
    );
}

fn observe_basic<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can observe INSERT on ALL changes to BasicModel", |cx| async move {
        let body = cx.isolated();
        let pending = ObserveCollector::new(cx.store.observe(Criteria::<BasicModel>::all()));
        cx.store.save(BasicModel::new(&body)).await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal(OpType::Insert)?;
        expect(&updates[0].element.body).to_equal(&body)?;
        anyhow::Ok(())
    });

    s.test("can observe UPDATE on ALL changes to BasicModel", |cx| async move {
        let body = cx.isolated();
        let saved = cx.store.save(BasicModel::new(&body)).await?;

        let pending = ObserveCollector::new(cx.store.observe(Criteria::<BasicModel>::all()));
        cx.store
            .save(saved.copy_of(|draft| draft.body = format!("{body} - edited")))
            .await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("UPDATE")?;
        expect(&updates[0].element.body).to_equal(format!("{body} - edited"))?;
        anyhow::Ok(())
    });

    s.test("can observe DELETE on ALL changes to BasicModel", |cx| async move {
        let body = cx.isolated();
        let saved = cx.store.save(BasicModel::new(&body)).await?;

        let pending = ObserveCollector::new(cx.store.observe(Criteria::<BasicModel>::all()));
        cx.store.delete(Criteria::of(&saved)).await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("DELETE")?;
        expect(&updates[0].element.body).to_equal(&body)?;
        anyhow::Ok(())
    });
}

/// Saves two posts and a comment on the first one.
async fn post_pair_with_comment<S: DataStore>(
    store: &S,
    prefix: &str,
) -> anyhow::Result<(Post, Post, Comment)> {
    let post_a = store.save(Post::new(make_id(), format!("{prefix} - post A"))).await?;
    let post_b = store.save(Post::new(make_id(), format!("{prefix} - post B"))).await?;
    let comment = store
        .save(Comment::new(make_id(), format!("{prefix} - comment")).with_post(&post_a))
        .await?;
    Ok((post_a, post_b, comment))
}

fn observe_cpk<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can observe INSERT on ALL changes to Post", |cx| async move {
        let title = cx.isolated();
        let pending = ObserveCollector::new(cx.store.observe(Criteria::<Post>::all()));
        cx.store.save(Post::new(make_id(), &title)).await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("INSERT")?;
        expect(&updates[0].element.title).to_equal(&title)?;
        anyhow::Ok(())
    });

    s.test("can observe INSERT on changes to Post by predicate", |cx| async move {
        let title = cx.isolated();
        let wanted = title.clone();
        let pending = ObserveCollector::new(
            cx.store
                .observe(Criteria::<Post>::matching(move |p| p.title == wanted)),
        );
        cx.store.save(Post::new(make_id(), &title)).await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("INSERT")?;
        expect(&updates[0].element.title).to_equal(&title)?;
        anyhow::Ok(())
    });

    s.test("can observe UPDATE on ALL changes to Comment", |cx| async move {
        let prefix = cx.isolated();
        let (_, post_b, comment) = post_pair_with_comment(&cx.store, &prefix).await?;

        let pending = ObserveCollector::new(cx.store.observe(Criteria::<Comment>::all()));
        let updated = cx
            .store
            .save(comment.copy_of(|draft| draft.set_post(&post_b)))
            .await?;
        expect(&updated.comment_id).to_equal(&comment.comment_id)?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("UPDATE")?;
        expect(&updates[0].element.content).to_equal(format!("{prefix} - comment"))?;
        expect(&updates[0].element.post_id).to_equal(&post_b.post_id)?;
        anyhow::Ok(())
    });

    s.test("can observe UPDATE on changes to Comment by predicate", |cx| async move {
        let prefix = cx.isolated();
        let (_, post_b, comment) = post_pair_with_comment(&cx.store, &prefix).await?;

        let content = comment.content.clone();
        let pending = ObserveCollector::new(
            cx.store
                .observe(Criteria::<Comment>::matching(move |c| c.content == content)),
        );
        let updated = cx
            .store
            .save(comment.copy_of(|draft| draft.set_post(&post_b)))
            .await?;
        expect(&updated.comment_id).to_equal(&comment.comment_id)?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("UPDATE")?;
        expect(&updates[0].element.content).to_equal(&comment.content)?;
        expect(&updates[0].element.post_id).to_equal(&post_b.post_id)?;
        anyhow::Ok(())
    });

    s.test("can observe UPDATE on changes to Comment by PK predicate", |cx| async move {
        let prefix = cx.isolated();
        let (_, post_b, comment) = post_pair_with_comment(&cx.store, &prefix).await?;

        let key = comment.key();
        let pending = ObserveCollector::new(cx.store.observe(Criteria::<Comment>::matching(
            move |c| c.comment_id == key.0 && c.content == key.1,
        )));
        let updated = cx
            .store
            .save(comment.copy_of(|draft| draft.set_post(&post_b)))
            .await?;
        expect(&updated.comment_id).to_equal(&comment.comment_id)?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("UPDATE")?;
        expect(&updates[0].element.content).to_equal(&comment.content)?;
        expect(&updates[0].element.post_id).to_equal(&post_b.post_id)?;
        anyhow::Ok(())
    });

    s.test_skip("can observe UPDATE on changes to Comment by PK object", |cx| async move {
        let prefix = cx.isolated();
        let (_, post_b, comment) = post_pair_with_comment(&cx.store, &prefix).await?;

        let pending = ObserveCollector::new(cx.store.observe(Criteria::of(&comment)));
        cx.store
            .save(comment.copy_of(|draft| draft.set_post(&post_b)))
            .await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(&updates[0].element.post_id).to_equal(&post_b.post_id)?;
        anyhow::Ok(())
    });

    s.test("can observe DELETE on ALL changes to Post", |cx| async move {
        let title = cx.isolated();
        let saved = cx.store.save(Post::new(make_id(), &title)).await?;

        let pending = ObserveCollector::new(cx.store.observe(Criteria::<Post>::all()));
        cx.store.delete(Criteria::of(&saved)).await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("DELETE")?;
        expect(&updates[0].element.title).to_equal(&title)?;
        anyhow::Ok(())
    });

    s.test("can observe DELETE on changes to Post by predicate", |cx| async move {
        let title = cx.isolated();
        let saved = cx.store.save(Post::new(make_id(), &title)).await?;

        let post_id = saved.post_id.clone();
        let pending = ObserveCollector::new(
            cx.store
                .observe(Criteria::<Post>::matching(move |p| p.post_id == post_id)),
        );
        cx.store.delete(Criteria::of(&saved)).await?;
        let updates = pending.collect().await?;

        expect(&updates).to_have_length(1)?;
        expect(updates[0].op_type).to_equal("DELETE")?;
        expect(&updates[0].element.title).to_equal(&title)?;
        anyhow::Ok(())
    });
}

fn observe_query_basic<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can get snapshot containing basic model", |cx| async move {
        let pending = SnapshotCollector::new(cx.store.observe_query(Criteria::<BasicModel>::all()));
        let saved = cx.store.save(BasicModel::new(cx.isolated())).await?;
        let snapshots = pending.collect().await;

        expect(snapshots.len()).to_be_greater_than_or_equal(1)?;
        let last = snapshots.last().context("no snapshot received")?;
        expect(last.items.len()).to_be_greater_than_or_equal(1)?;
        expect(last.items.iter().any(|m| m.id() == saved.id())).to_be(true)?;
        anyhow::Ok(())
    });
}

fn observe_query_cpk<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can get snapshot containing Post (HAS MANY parent) with ALL", |cx| async move {
        let pending = SnapshotCollector::new(cx.store.observe_query(Criteria::<Post>::all()));
        let saved = cx
            .store
            .save(Post::new(make_id(), format!("{} - post", cx.isolated())))
            .await?;
        let snapshots = pending.collect().await;

        expect(snapshots.len()).to_be_greater_than_or_equal(1)?;
        let last = snapshots.last().context("no snapshot received")?;
        expect(last.items.len()).to_be_greater_than_or_equal(1)?;
        expect(last.items.iter().any(|p| p.post_id == saved.post_id)).to_be(true)?;
        anyhow::Ok(())
    });

    s.test(
        "can get snapshot containing Post (HAS MANY parent) with title predicate",
        |cx| async move {
            let title = format!("{} - post", cx.isolated());
            let wanted = title.clone();
            let pending = SnapshotCollector::new(
                cx.store
                    .observe_query(Criteria::<Post>::matching(move |p| p.title == wanted)),
            );
            let saved = cx.store.save(Post::new(make_id(), title)).await?;
            let snapshots = pending.collect().await;

            expect(snapshots.len()).to_be_greater_than_or_equal(1)?;
            let last = snapshots.last().context("no snapshot received")?;
            expect(last.items.len()).to_be_greater_than_or_equal(1)?;
            expect(last.items.iter().any(|p| p.post_id == saved.post_id)).to_be(true)?;
            anyhow::Ok(())
        },
    );

    s.test(
        "can get snapshot containing Post (HAS MANY parent) with postId predicate",
        |cx| async move {
            let post_id = make_id();
            let wanted = post_id.clone();
            let pending = SnapshotCollector::new(
                cx.store
                    .observe_query(Criteria::<Post>::matching(move |p| p.post_id == wanted)),
            );
            let saved = cx
                .store
                .save(Post::new(post_id, format!("{} - post", cx.isolated())))
                .await?;
            let snapshots = pending.collect().await;

            expect(snapshots.len()).to_be_greater_than_or_equal(1)?;
            let last = snapshots.last().context("no snapshot received")?;
            expect(last.items.len()).to_be_greater_than_or_equal(1)?;
            expect(last.items.iter().any(|p| p.post_id == saved.post_id)).to_be(true)?;
            anyhow::Ok(())
        },
    );
}

fn related<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("can create a comment on a post", |cx| async move {
        let post = cx
            .store
            .save(Post::new(make_id(), format!("{} post", cx.name())))
            .await?;
        let comment = cx
            .store
            .save(Comment::new(make_id(), format!("{} comment", cx.name())).with_post(&post))
            .await?;

        expect(&comment).to_be_defined()?;
        expect(&comment.comment_id).to_be_truthy()?;
        expect(&comment.post_id).to_be_defined()?;
        anyhow::Ok(())
    });

    s.test("created comment on post can be retrieved by PK with post", |cx| async move {
        let post = cx
            .store
            .save(Post::new(make_id(), format!("{} post", cx.name())))
            .await?;
        let comment = cx
            .store
            .save(Comment::new(make_id(), format!("{} comment", cx.name())).with_post(&post))
            .await?;

        let retrieved = cx
            .store
            .query_by_key::<Comment>(comment.key())
            .await?
            .context("comment not found")?;
        expect(&retrieved.comment_id).to_equal(&comment.comment_id)?;
        expect(&retrieved.content).to_equal(&comment.content)?;
        expect(retrieved.belongs_to(&post)).to_be_truthy()?;
        anyhow::Ok(())
    });

    s.test(
        "can retrieve comment created on post to be retrieved by post id",
        |cx| async move {
            let post = cx
                .store
                .save(Post::new(make_id(), format!("{} post", cx.name())))
                .await?;
            let comment = cx
                .store
                .save(Comment::new(make_id(), format!("{} comment", cx.name())).with_post(&post))
                .await?;

            let post_id = post.post_id.clone();
            let comments = cx
                .store
                .query(Criteria::<Comment>::matching(move |c| {
                    c.post_id.as_deref() == Some(post_id.as_str())
                }))
                .await?;

            expect(&comments).to_have_length(1)?;
            expect(&comments[0].comment_id).to_equal(&comment.comment_id)?;
            expect(&comments[0].post_id).to_equal(&post.post_id)?;
            anyhow::Ok(())
        },
    );
}

fn expected_errors<S: DataStore + Clone + 'static>(s: &Scope<S>) {
    s.test("cannot delete object that doesn't exist - baseline error", |cx| async move {
        let saved = cx
            .store
            .save(BasicModel::new(format!("{} - basic model", cx.name())))
            .await?;
        let deleted = cx.store.delete(Criteria::<BasicModel>::key(make_id())).await?;
        let retrieved = cx.store.query_by_key::<BasicModel>(saved.key()).await?;

        expect(deleted).to_equal(Vec::<BasicModel>::new())?;
        expect(retrieved).to_be_defined()?;
        anyhow::Ok(())
    });

    s.test("cannot save a post (HAS_MANY parent) without an ID", |cx| async move {
        expect(|| cx.store.save(Post::new("", cx.name())))
            .rejects()
            .to_throw()
            .await?;
        anyhow::Ok(())
    });

    s.test("cannot create a comment without an ID", |cx| async move {
        expect(|| cx.store.save(Comment::new("", cx.name())))
            .rejects()
            .to_throw()
            .await?;
        anyhow::Ok(())
    });
}
