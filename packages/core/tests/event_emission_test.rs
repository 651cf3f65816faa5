//! Event Emission Tests
//!
//! Tests that verify correct event emission for all mutating operations.
//! Each committed operation emits exactly one event, after the commit;
//! aborted operations emit nothing.

#[cfg(test)]
mod event_emission_tests {
    use anyhow::Result;
    use mediatree_core::config::MediaTreeConfig;
    use mediatree_core::db::{DomainEvent, InMemoryStore};
    use mediatree_core::models::{ContentType, Node, User, ROOT_ID};
    use mediatree_core::operations::{CreateNodeParams, HookDecision, HookPoint, HookRegistry};
    use mediatree_core::services::MediaTreeService;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::sync::broadcast::Receiver;
    use tokio::time::{timeout, Duration};

    const FOLDER: i64 = 1031;
    const IMAGE: i64 = 1032;

    /// Helper to create a service over an empty tree
    async fn create_test_service(hooks: HookRegistry) -> Result<MediaTreeService> {
        let store = Arc::new(InMemoryStore::new());
        store
            .register_content_type(
                ContentType::new(FOLDER, "Folder")
                    .with_allowed_as_root(true)
                    .with_allowed_children([FOLDER, IMAGE]),
            )
            .await;
        store.register_content_type(ContentType::new(IMAGE, "Image")).await;

        Ok(MediaTreeService::new(store, MediaTreeConfig::default())?.with_hooks(hooks))
    }

    fn admin() -> User {
        User::unrestricted(1, "admin")
    }

    async fn next_event(rx: &mut Receiver<DomainEvent>) -> DomainEvent {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("Event should be emitted within 1 second")
            .expect("Should receive event")
    }

    fn assert_no_event(rx: &mut Receiver<DomainEvent>) {
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    async fn create_image(service: &MediaTreeService, name: &str, parent_id: i64) -> Result<Node> {
        Ok(service
            .create_node(CreateNodeParams {
                name: name.to_string(),
                content_type_id: IMAGE,
                parent_id: Some(parent_id),
            })
            .await?)
    }

    #[tokio::test]
    async fn test_create_emits_node_created() -> Result<()> {
        let service = create_test_service(HookRegistry::new()).await?;
        let mut rx = service.subscribe_to_events();

        let folder = service.add_folder("Photos", ROOT_ID, &admin()).await?;

        match next_event(&mut rx).await {
            DomainEvent::NodeCreated { node } => {
                assert_eq!(node.id, folder.id);
                assert_eq!(node.content_type_id, FOLDER);
            }
            other => panic!("Expected NodeCreated event, got {:?}", other),
        }
        assert_no_event(&mut rx);
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_emits_node_saved() -> Result<()> {
        let service = create_test_service(HookRegistry::new()).await?;
        let admin = admin();
        let folder = service.add_folder("Photos", ROOT_ID, &admin).await?;

        let mut rx = service.subscribe_to_events();

        service.rename_node(folder.id, "Pictures", &admin).await?;
        match next_event(&mut rx).await {
            DomainEvent::NodeSaved { node } => {
                assert_eq!(node.id, folder.id);
                assert_eq!(node.name, "Pictures");
                assert_eq!(node.version, 2);
            }
            other => panic!("Expected NodeSaved event, got {:?}", other),
        }

        // Skipped uploads create nothing and announce nothing
        assert!(service.add_file("web.config", folder.id, &admin).await?.is_none());
        assert_no_event(&mut rx);
        Ok(())
    }

    #[tokio::test]
    async fn test_move_and_copy_events() -> Result<()> {
        let service = create_test_service(HookRegistry::new()).await?;
        let admin = admin();
        let photos = service.add_folder("Photos", ROOT_ID, &admin).await?;
        let archive = service.add_folder("Archive", ROOT_ID, &admin).await?;
        let beach = create_image(&service, "beach.jpg", photos.id).await?;

        // Subscribe AFTER setup to avoid catching NodeCreated
        let mut rx = service.subscribe_to_events();

        service.move_node(beach.id, archive.id, &admin).await?;
        match next_event(&mut rx).await {
            DomainEvent::NodeMoved {
                node_id,
                old_parent_id,
                new_parent_id,
                path,
                subtree_size,
            } => {
                assert_eq!(node_id, beach.id);
                assert_eq!(old_parent_id, photos.id);
                assert_eq!(new_parent_id, archive.id);
                assert_eq!(path.to_string(), format!("-1,{},{}", archive.id, beach.id));
                assert_eq!(subtree_size, 1);
            }
            other => panic!("Expected NodeMoved event, got {:?}", other),
        }

        let copy = service.copy_node(archive.id, photos.id, &admin).await?;
        match next_event(&mut rx).await {
            DomainEvent::NodeCopied {
                source_id,
                copy_id,
                parent_id,
                subtree_size,
            } => {
                assert_eq!(source_id, archive.id);
                assert_eq!(copy_id, copy.id);
                assert_eq!(parent_id, photos.id);
                assert_eq!(subtree_size, 2);
            }
            other => panic!("Expected NodeCopied event, got {:?}", other),
        }
        assert_no_event(&mut rx);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_events_follow_lifecycle() -> Result<()> {
        let service = create_test_service(HookRegistry::new()).await?;
        let admin = admin();
        let photos = service.add_folder("Photos", ROOT_ID, &admin).await?;
        create_image(&service, "beach.jpg", photos.id).await?;
        let docs = service.add_folder("Docs", ROOT_ID, &admin).await?;

        let mut rx = service.subscribe_to_events();

        service.delete_node(photos.id, &admin).await?;
        assert!(matches!(
            next_event(&mut rx).await,
            DomainEvent::NodeTrashed { node_id, subtree_size: 2 } if node_id == photos.id
        ));

        service.delete_node(photos.id, &admin).await?;
        assert!(matches!(
            next_event(&mut rx).await,
            DomainEvent::NodeErased { node_id, subtree_size: 2 } if node_id == photos.id
        ));

        service.delete_node(docs.id, &admin).await?;
        next_event(&mut rx).await;

        service.empty_recycle_bin(&admin).await?;
        assert!(matches!(
            next_event(&mut rx).await,
            DomainEvent::RecycleBinEmptied { erased_count: 1 }
        ));

        // Nothing left to erase: no event
        service.empty_recycle_bin(&admin).await?;
        assert_no_event(&mut rx);
        Ok(())
    }

    #[tokio::test]
    async fn test_sort_emits_children_sorted() -> Result<()> {
        let service = create_test_service(HookRegistry::new()).await?;
        let admin = admin();
        let photos = service.add_folder("Photos", ROOT_ID, &admin).await?;
        let a = create_image(&service, "a.jpg", photos.id).await?;
        let b = create_image(&service, "b.jpg", photos.id).await?;

        let mut rx = service.subscribe_to_events();

        service.sort_children(photos.id, &[b.id, a.id], &admin).await?;
        match next_event(&mut rx).await {
            DomainEvent::ChildrenSorted { parent_id, node_ids } => {
                assert_eq!(parent_id, photos.id);
                assert_eq!(node_ids, vec![b.id, a.id]);
            }
            other => panic!("Expected ChildrenSorted event, got {:?}", other),
        }

        // An empty request changes nothing and announces nothing
        service.sort_children(photos.id, &[], &admin).await?;
        assert_no_event(&mut rx);
        Ok(())
    }

    #[tokio::test]
    async fn test_aborted_operations_emit_nothing() -> Result<()> {
        let mut hooks = HookRegistry::new();
        hooks.register(|point: HookPoint, _: &Node| {
            if point == HookPoint::Trashing {
                HookDecision::cancel("trash disabled")
            } else {
                HookDecision::Proceed
            }
        });
        let service = create_test_service(hooks).await?;
        let admin = admin();
        let photos = service.add_folder("Photos", ROOT_ID, &admin).await?;
        let beach = create_image(&service, "beach.jpg", photos.id).await?;

        let mut rx = service.subscribe_to_events();

        assert!(service.delete_node(photos.id, &admin).await.is_err());
        // Images may not live at the root
        assert!(service.move_node(beach.id, ROOT_ID, &admin).await.is_err());
        assert!(service.sort_children(photos.id, &[beach.id, 4040], &admin).await.is_err());

        assert_no_event(&mut rx);
        Ok(())
    }

    #[tokio::test]
    async fn test_events_serialize_for_clients() -> Result<()> {
        let service = create_test_service(HookRegistry::new()).await?;
        let mut rx = service.subscribe_to_events();

        let folder = service.add_folder("Photos", ROOT_ID, &admin()).await?;
        let event = next_event(&mut rx).await;
        assert_eq!(event.event_type(), "node:created");

        let json = serde_json::to_value(&event)?;
        assert_eq!(json["type"], "nodeCreated");
        assert_eq!(json["node"]["id"], folder.id);
        assert_eq!(json["node"]["path"], format!("-1,{}", folder.id));
        Ok(())
    }
}
