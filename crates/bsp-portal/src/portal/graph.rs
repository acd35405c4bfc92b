//! Queries over the portal adjacency graph.
//!
//! The graph's nodes are leaf portals; two portals are adjacent when any
//! face of one lists a face of the other in its connected portal faces.
//! Exterior classification is stored on the portals. Hop traces are pure
//! queries, with [`BspTree::apply_trace`] as the separate display step.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::bsp::BspTree;
use crate::{BspError, Result};

use super::portal::PortalId;

impl BspTree {
    fn check_portal(&self, id: PortalId) -> Result<()> {
        if id.0 < self.portals.len() {
            Ok(())
        } else {
            Err(BspError::UnknownPortal(id))
        }
    }

    /// Portals adjacent to `id`, sorted and without duplicates.
    pub fn portal_neighbors(&self, id: PortalId) -> Result<Vec<PortalId>> {
        self.check_portal(id)?;
        Ok(self.neighbors(id))
    }

    fn neighbors(&self, id: PortalId) -> Vec<PortalId> {
        let mut out: Vec<PortalId> = self.portals[id.0]
            .faces()
            .iter()
            .flat_map(|f| f.connected_portal_faces())
            .map(|r| r.portal)
            .filter(|p| *p != id)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Ids of every portal currently marked exterior.
    pub fn exterior_portals(&self) -> Vec<PortalId> {
        (0..self.portals.len())
            .map(PortalId)
            .filter(|id| self.portals[id.0].is_exterior())
            .collect()
    }

    /// Flood-fills the exterior flag from the first portal with an open
    /// bounding box wall, returning that portal.
    ///
    /// A wall is open when it lies on the bounding box and has no model
    /// faces against it. Returns `None` (and marks nothing) if no portal
    /// qualifies.
    pub fn classify_exterior(&mut self) -> Option<PortalId> {
        let start = self.portals.iter().position(|portal| {
            portal
                .faces()
                .iter()
                .any(|f| f.is_exterior_wall() && f.connected_model_faces().is_empty())
        });
        match start {
            Some(start) => {
                let start = PortalId(start);
                self.flood_exterior(start);
                Some(start)
            }
            None => {
                warn!("no open bounding wall, exterior left unclassified");
                None
            }
        }
    }

    /// Clears the exterior flags and flood-fills them from `start`.
    pub fn classify_exterior_from(&mut self, start: PortalId) -> Result<()> {
        self.check_portal(start)?;
        self.flood_exterior(start);
        Ok(())
    }

    fn flood_exterior(&mut self, start: PortalId) {
        for portal in &mut self.portals {
            portal.set_exterior(false);
        }

        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if self.portals[id.0].is_exterior() {
                continue;
            }
            self.portals[id.0].set_exterior(true);
            stack.extend(self.neighbors(id));
        }
        debug!(
            "exterior flood from {:?} reached {} of {} portals",
            start,
            self.portals.iter().filter(|p| p.is_exterior()).count(),
            self.portals.len()
        );
    }

    /// Fewest hops from `start` to `target`, or `None` if unreachable.
    pub fn trace_to_portal(&self, start: PortalId, target: PortalId) -> Result<Option<usize>> {
        Ok(self.trace_path(start, target)?.map(|path| path.len() - 1))
    }

    /// A shortest portal path from `start` to `target`, both included.
    pub fn trace_path(&self, start: PortalId, target: PortalId) -> Result<Option<Vec<PortalId>>> {
        self.check_portal(start)?;
        self.check_portal(target)?;

        let mut came_from: Vec<Option<PortalId>> = vec![None; self.portals.len()];
        let mut seen = vec![false; self.portals.len()];
        let mut queue = VecDeque::from([start]);
        seen[start.0] = true;

        while let Some(current) = queue.pop_front() {
            if current == target {
                let mut path = vec![current];
                let mut cursor = current;
                while let Some(prev) = came_from[cursor.0] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Ok(Some(path));
            }
            for next in self.neighbors(current) {
                if !seen[next.0] {
                    seen[next.0] = true;
                    came_from[next.0] = Some(current);
                    queue.push_back(next);
                }
            }
        }
        Ok(None)
    }

    /// Shows only the portals on `path` and numbers them in path order.
    pub fn apply_trace(&mut self, path: &[PortalId]) -> Result<()> {
        for id in path {
            self.check_portal(*id)?;
        }
        for portal in &mut self.portals {
            portal.set_visible(false);
            portal.set_trace_index(None);
        }
        for (hop, id) in path.iter().enumerate() {
            let portal = &mut self.portals[id.0];
            portal.set_visible(true);
            portal.set_trace_index(Some(hop));
        }
        Ok(())
    }

    /// Makes every portal visible and clears trace numbering.
    pub fn show_all(&mut self) {
        for portal in &mut self.portals {
            portal.set_visible(true);
            portal.set_trace_index(None);
        }
    }
}
