//! Saved view service.

use crate::model::directory::UserId;
use crate::model::saved_view::{NewSavedView, SavedView, SavedViewId, SavedViewPatch};
use crate::repo::view_repo::SavedViewRepository;
use crate::service::{ServiceError, ServiceResult};

pub struct SavedViewService<R: SavedViewRepository> {
    repo: R,
}

impl<R: SavedViewRepository> SavedViewService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_view(&self, user_id: UserId, input: NewSavedView) -> ServiceResult<SavedView> {
        let view = SavedView::from_new(user_id, input);
        let id = self.repo.create_view(&view)?;
        self.repo
            .get_view(user_id, id)?
            .ok_or(ServiceError::InconsistentState(
                "created view missing on read-back",
            ))
    }

    pub fn update_view(
        &self,
        user_id: UserId,
        id: SavedViewId,
        patch: SavedViewPatch,
    ) -> ServiceResult<SavedView> {
        let mut view = self.get_owned(user_id, id)?;
        view.apply_patch(patch);
        self.repo.update_view(&view)?;
        self.get_owned(user_id, id)
    }

    /// Returns the view only when `user_id` owns it.
    pub fn get_view(&self, user_id: UserId, id: SavedViewId) -> ServiceResult<SavedView> {
        self.get_owned(user_id, id)
    }

    pub fn list_views(&self, user_id: UserId) -> ServiceResult<Vec<SavedView>> {
        Ok(self.repo.list_views(user_id)?)
    }

    pub fn delete_view(&self, user_id: UserId, id: SavedViewId) -> ServiceResult<()> {
        self.repo.delete_view(user_id, id)?;
        Ok(())
    }

    fn get_owned(&self, user_id: UserId, id: SavedViewId) -> ServiceResult<SavedView> {
        self.repo
            .get_view(user_id, id)?
            .ok_or_else(|| ServiceError::not_found("saved view", id))
    }
}
