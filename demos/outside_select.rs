//! 直接使用上下文的示例
//!
//! 不透過連線，自行訂閱狀態容器並在回呼中執行選擇器。
//! 另外示範以全域鍵在多個上下文之間共用計算結果。

use anyhow::Result;
use memo::prelude::*;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
struct State {
    todos: Rc<Vec<(u32, bool)>>,
    hide_done: bool,
}

type Tools<'a> = StoreTools<'a, State>;

fn select_visible_count(tools: &Tools<'_>, _: ()) -> memo::Result<usize> {
    let state = tools.state();
    tools.memo(
        || {
            state
                .todos
                .iter()
                .filter(|(_, done)| !state.hide_done || !done)
                .count()
        },
        deps![&state.todos, state.hide_done],
    )
}

fn find_by_id(tools: &Tools<'_>, id: u32) -> memo::Result<Option<(u32, bool)>> {
    let todos = &tools.state().todos;
    tools.global_memo(
        ("find_by_id", id),
        || {
            tracing::info!("搜尋待辦事項 {}", id);
            todos.iter().find(|(todo, _)| *todo == id).copied()
        },
        deps![todos],
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("outside_select=info".parse()?),
        )
        .init();

    println!("=== 外部選擇示例 ===\n");

    let store = Rc::new(SimpleStore::new(State::default()));
    let manager = StoreMemoManager::new(Rc::clone(&store));
    let outside = Rc::new(manager.create_context("outside"));

    let previous: Rc<Cell<Option<usize>>> = Rc::new(Cell::new(None));
    let select_outside = {
        let outside = Rc::clone(&outside);
        let previous = Rc::clone(&previous);
        move || match outside.execute(select_visible_count, ()) {
            Ok(count) => {
                if let Some(before) = previous.get().filter(|before| *before != count) {
                    println!("todos count changed ! ({before} => {count})");
                }
                previous.set(Some(count));
            }
            Err(err) => tracing::warn!("外部選擇失敗: {}", err),
        }
    };
    select_outside();
    let subscription = manager.subscribe(select_outside);

    store.update(|draft| Rc::make_mut(&mut draft.todos).push((0, false)));
    store.update(|draft| Rc::make_mut(&mut draft.todos).push((1, true)));
    // 隱藏已完成的項目，計數從 2 變成 1
    store.update(|draft| draft.hide_done = true);
    // 無關的更新不會改變計數
    store.update(|draft| draft.hide_done = true);

    println!("\n兩個上下文以同一個全域鍵搜尋:");
    let a = manager.create_context("a");
    let b = manager.create_context("b");
    let from_a = a.execute(find_by_id, 1)?;
    let from_b = b.execute(find_by_id, 1)?;
    println!("a => {from_a:?}, b => {from_b:?}");

    let snapshot = manager.memo_manager().snapshot();
    println!("\n快取快照:\n{}", snapshot.to_json()?);

    subscription.unsubscribe();
    for ctx in [&a, &b] {
        ctx.destroy()?;
    }
    outside.destroy()?;

    Ok(())
}
