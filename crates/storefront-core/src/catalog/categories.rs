//! Category operations of the catalog.

use super::Catalog;
use crate::hierarchy::{self, CategoryNode, IntegrityReport, TreeReport};
use crate::input::{BulkCategory, CategoryPatch, ImageSlot, NewCategory, check_batch_size, slugify};
use crate::media::extract_public_id;
use crate::query::{self, CategoryListing, CategoryQuery, Page};
use crate::{Category, CategoryId, ImageAsset, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Result of a category bulk upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCategoryOutcome {
    /// Created records in creation order, auto-created parents included.
    pub created: Vec<Category>,
    /// Slugs of rows skipped because the name or slug already existed.
    pub skipped: Vec<String>,
}

/// Result of replacing a category image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReplacement {
    pub category: Category,
    /// Handle of the previous image, to be destroyed on the media host.
    pub replaced_public_id: Option<String>,
}

/// Fill in a missing `public_id` from the image URL.
pub(super) fn resolve_image(image: ImageAsset) -> ImageAsset {
    let url = image.url.trim().to_string();
    let public_id = match image.public_id.trim() {
        "" => extract_public_id(&url),
        given => given.to_string(),
    };
    ImageAsset { url, public_id }
}

fn image_from_url(url: Option<String>) -> Option<ImageAsset> {
    url.filter(|u| !u.trim().is_empty())
        .map(|url| resolve_image(ImageAsset::new(url, "")))
}

fn check_parent_exists(records: &[Category], parent: CategoryId) -> Result<(), StoreError> {
    if records.iter().any(|c| c.id == parent) {
        Ok(())
    } else {
        Err(StoreError::InvalidInput(format!(
            "parent category {parent} does not exist"
        )))
    }
}

fn check_unique(
    records: &[Category],
    name: Option<&str>,
    slug: Option<&str>,
    except: Option<CategoryId>,
) -> Result<(), StoreError> {
    for other in records.iter().filter(|c| Some(c.id) != except) {
        if name.is_some_and(|n| other.name == n) {
            return Err(StoreError::Conflict(format!(
                "category name already exists: {}",
                other.name
            )));
        }
        if slug.is_some_and(|s| other.slug == s) {
            return Err(StoreError::Conflict(format!(
                "category slug already exists: {}",
                other.slug
            )));
        }
    }
    Ok(())
}

impl Catalog {
    /// Create one category.
    pub fn create_category(&mut self, input: NewCategory) -> Result<Category, StoreError> {
        input.validate()?;

        let records = self.store().categories()?;
        let name = input.name.trim().to_string();
        let slug = input.slug.trim().to_string();
        check_unique(&records, Some(&name), Some(&slug), None)?;
        if let Some(parent) = input.parent {
            check_parent_exists(&records, parent)?;
        }

        let now = self.now();
        let id = self.store_mut().allocate_category_id()?;
        let category = Category {
            id,
            name,
            slug,
            parent: input.parent,
            description: input.description,
            icon: input.icon.map(resolve_image),
            banner: input.banner.map(resolve_image),
            is_active: input.is_active,
            is_featured: input.is_featured,
            created_at: now,
            updated_at: now,
        };
        self.store_mut().put_category(&category)?;
        Ok(category)
    }

    /// Create many categories with parents referenced by name.
    ///
    /// Rows whose name or slug already exists are skipped. A parent name
    /// that matches no category creates an active, non-featured root with
    /// a slug derived from the name. Every row is validated before anything
    /// is written, and all records are written in one batch.
    pub fn bulk_upload_categories(
        &mut self,
        items: Vec<BulkCategory>,
    ) -> Result<BulkCategoryOutcome, StoreError> {
        check_batch_size(items.len())?;
        for item in &items {
            item.validate()?;
        }

        let existing = self.store().categories()?;
        let mut ids_by_name: BTreeMap<String, CategoryId> =
            existing.iter().map(|c| (c.name.clone(), c.id)).collect();
        let mut slugs: BTreeSet<String> = existing.iter().map(|c| c.slug.clone()).collect();

        let now = self.now();
        let mut created = Vec::new();
        let mut skipped = Vec::new();

        for item in items {
            let name = item.name.trim().to_string();
            let slug = item.slug.trim().to_string();
            if slugs.contains(&slug) || ids_by_name.contains_key(&name) {
                skipped.push(slug);
                continue;
            }

            let parent_name = item
                .parent
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty());
            let parent = match parent_name {
                None => None,
                Some(parent_name) => match ids_by_name.get(parent_name) {
                    Some(&id) => Some(id),
                    None => {
                        let parent_slug = slugify(parent_name);
                        if !slugs.insert(parent_slug.clone()) {
                            return Err(StoreError::Conflict(format!(
                                "cannot create parent {parent_name}: slug {parent_slug} already exists"
                            )));
                        }
                        let id = self.store_mut().allocate_category_id()?;
                        ids_by_name.insert(parent_name.to_string(), id);
                        created.push(Category {
                            id,
                            name: parent_name.to_string(),
                            slug: parent_slug,
                            parent: None,
                            description: String::new(),
                            icon: None,
                            banner: None,
                            is_active: true,
                            is_featured: false,
                            created_at: now,
                            updated_at: now,
                        });
                        Some(id)
                    }
                },
            };

            // A row naming itself as parent, or a later row's parent, may have
            // just claimed this name or slug.
            if slugs.contains(&slug) || ids_by_name.contains_key(&name) {
                skipped.push(slug);
                continue;
            }

            let id = self.store_mut().allocate_category_id()?;
            ids_by_name.insert(name.clone(), id);
            slugs.insert(slug.clone());
            created.push(Category {
                id,
                name,
                slug,
                parent,
                description: item.description.unwrap_or_default(),
                icon: image_from_url(item.icon),
                banner: image_from_url(item.banner),
                is_active: item.is_active.unwrap_or(true),
                is_featured: item.is_featured.unwrap_or(false),
                created_at: now,
                updated_at: now,
            });
        }

        if !created.is_empty() {
            self.store_mut().put_categories(&created)?;
        }
        Ok(BulkCategoryOutcome { created, skipped })
    }

    /// Filtered, paginated category list.
    pub fn list_categories(
        &self,
        query: &CategoryQuery,
    ) -> Result<Page<CategoryListing>, StoreError> {
        query::list_categories(&self.store().categories()?, query)
    }

    pub fn get_category(&self, id: CategoryId) -> Result<Category, StoreError> {
        self.store()
            .get_category(id)?
            .ok_or(StoreError::CategoryNotFound(id))
    }

    /// The full category forest plus the records left out of it.
    pub fn category_tree(&self) -> Result<(Vec<CategoryNode>, TreeReport), StoreError> {
        Ok(hierarchy::build_tree_with_report(
            &self.store().categories()?,
        ))
    }

    /// A category's id plus the ids of all its descendants.
    pub fn category_descendants(&self, id: CategoryId) -> Result<BTreeSet<CategoryId>, StoreError> {
        let records = self.store().categories()?;
        if !records.iter().any(|c| c.id == id) {
            return Err(StoreError::CategoryNotFound(id));
        }
        Ok(hierarchy::collect_descendant_ids(id, &records))
    }

    pub fn audit_categories(&self) -> Result<IntegrityReport, StoreError> {
        Ok(hierarchy::audit(&self.store().categories()?))
    }

    /// Update a category's own fields.
    ///
    /// A parent reassignment must point at an existing category that is not
    /// the category itself or one of its descendants.
    pub fn update_category(
        &mut self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, StoreError> {
        patch.validate()?;

        let records = self.store().categories()?;
        let mut category = records
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::CategoryNotFound(id))?;

        let name = patch.name.as_deref().map(str::trim);
        let slug = patch.slug.as_deref().map(str::trim);
        check_unique(&records, name, slug, Some(id))?;
        if let Some(name) = name {
            category.name = name.to_string();
        }
        if let Some(slug) = slug {
            category.slug = slug.to_string();
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        if let Some(parent) = patch.parent {
            if let Some(new_parent) = parent {
                check_parent_exists(&records, new_parent)?;
                if hierarchy::would_create_cycle(id, new_parent, &records) {
                    return Err(StoreError::CycleDetected {
                        id,
                        parent: new_parent,
                    });
                }
            }
            category.parent = parent;
        }
        if let Some(is_active) = patch.is_active {
            category.is_active = is_active;
        }
        if let Some(is_featured) = patch.is_featured {
            category.is_featured = is_featured;
        }

        category.updated_at = self.now();
        self.store_mut().put_category(&category)?;
        Ok(category)
    }

    /// Replace the banner or icon of a category.
    pub fn replace_category_image(
        &mut self,
        id: CategoryId,
        slot: ImageSlot,
        image: ImageAsset,
    ) -> Result<ImageReplacement, StoreError> {
        if image.url.trim().is_empty() {
            return Err(StoreError::InvalidInput(format!("{slot} image is required")));
        }
        let mut category = self.get_category(id)?;
        let image = resolve_image(image);

        let target = match slot {
            ImageSlot::Banner => &mut category.banner,
            ImageSlot::Icon => &mut category.icon,
        };
        let replaced_public_id = target
            .replace(image)
            .map(|old| old.public_id)
            .filter(|old| !old.is_empty())
            .filter(|old| target.as_ref().is_none_or(|new| new.public_id != *old));

        category.updated_at = self.now();
        self.store_mut().put_category(&category)?;
        Ok(ImageReplacement {
            category,
            replaced_public_id,
        })
    }

    /// Delete a category that has no subcategories and no products.
    ///
    /// Returns the public ids of its images, to be destroyed on the media
    /// host.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<Vec<String>, StoreError> {
        let category = self.get_category(id)?;

        if self
            .store()
            .categories()?
            .iter()
            .any(|c| c.parent == Some(id))
        {
            return Err(StoreError::HasChildren(id));
        }
        let product_count = self
            .store()
            .products()?
            .iter()
            .filter(|p| p.category == id)
            .count();
        if product_count > 0 {
            return Err(StoreError::HasProducts(id, product_count));
        }

        self.store_mut().remove_category(id)?;
        Ok(category.image_public_ids())
    }
}

// =============================================================================
// TESTS
// =============================================================================
